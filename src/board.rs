//! Game board state: a coordinate-indexed square arena plus one ship per
//! kind. Pure data and validation, no I/O.

use crate::common::{BoardError, ShotOutcome};
use crate::config::{BOARD_SIZE, FLEET, NUM_SHIPS};
use crate::ship::{Orientation, Ship, ShipKind, ShipPlacement};

/// One grid cell. A square belongs to at most one ship, identified by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Square {
    guessed: bool,
    ship: Option<ShipKind>,
}

/// A 10x10 board owning five ships, one per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Square; BOARD_SIZE as usize]; BOARD_SIZE as usize],
    ships: [Ship; NUM_SHIPS],
    locked: bool,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create an empty board with all ships unplaced.
    pub fn new() -> Self {
        let ships = core::array::from_fn(|i| Ship::new(FLEET[i]));
        Board {
            squares: [[Square::default(); BOARD_SIZE as usize]; BOARD_SIZE as usize],
            ships,
            locked: false,
        }
    }

    /// Build a board by replaying a client's declared placements against an
    /// empty grid. Rejects fleets that are not exactly one ship per kind, or
    /// where any replayed placement goes out of bounds or overlaps.
    pub fn from_placements(placements: &[ShipPlacement]) -> Result<Self, BoardError> {
        if placements.len() != NUM_SHIPS {
            return Err(BoardError::IncompleteFleet);
        }
        let mut board = Board::new();
        for p in placements {
            board.place_ship(p.kind, p.x, p.y, p.orientation)?;
        }
        if !board.ships.iter().all(Ship::is_placed) {
            return Err(BoardError::IncompleteFleet);
        }
        board.locked = true;
        Ok(board)
    }

    /// Whether placement edits are still allowed.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn ship(&self, kind: ShipKind) -> &Ship {
        &self.ships[kind.index()]
    }

    /// Whether (`x`, `y`) has already been shot at. Callers bounds-check
    /// coordinates before consulting this.
    pub fn is_guessed(&self, x: u8, y: u8) -> bool {
        x < BOARD_SIZE && y < BOARD_SIZE && self.squares[x as usize][y as usize].guessed
    }

    /// Place a ship with its top-left square at (`x`, `y`). On error the
    /// board is left untouched.
    pub fn place_ship(
        &mut self,
        kind: ShipKind,
        x: u8,
        y: u8,
        orientation: Orientation,
    ) -> Result<(), BoardError> {
        if self.locked || self.ships[kind.index()].is_placed() {
            return Err(BoardError::ShipAlreadyPlaced);
        }
        let cells = Ship::cells_at(kind, x, y, orientation)?;
        if cells
            .iter()
            .any(|&(cx, cy)| self.squares[cx as usize][cy as usize].ship.is_some())
        {
            return Err(BoardError::ShipOverlaps);
        }
        for (cx, cy) in cells {
            self.squares[cx as usize][cy as usize].ship = Some(kind);
        }
        self.ships[kind.index()].set_origin(x, y, orientation);
        Ok(())
    }

    /// Validate this board by replaying its ships' declared origins against
    /// a fresh board and comparing ship presence cell for cell. Guards
    /// against a board whose squares were edited independently of a legal
    /// placement.
    pub fn is_valid(&self) -> bool {
        let mut reference = Board::new();
        for ship in &self.ships {
            let (x, y) = match ship.origin() {
                Some(origin) => origin,
                None => return false,
            };
            if reference
                .place_ship(ship.kind(), x, y, ship.orientation())
                .is_err()
            {
                return false;
            }
        }
        self.placement_equals(&reference)
    }

    /// Whether two boards have identical per-square ship-kind patterns.
    pub fn placement_equals(&self, other: &Board) -> bool {
        for x in 0..BOARD_SIZE as usize {
            for y in 0..BOARD_SIZE as usize {
                if self.squares[x][y].ship != other.squares[x][y].ship {
                    return false;
                }
            }
        }
        true
    }

    /// Apply a shot at (`x`, `y`): mark the square guessed and damage the
    /// occupying ship, if any. Repeated shots are rejected upstream as a
    /// protocol violation but also error here.
    pub fn apply_shot(&mut self, x: u8, y: u8) -> Result<ShotOutcome, BoardError> {
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(BoardError::OutOfBounds);
        }
        let square = &mut self.squares[x as usize][y as usize];
        if square.guessed {
            return Err(BoardError::AlreadyGuessed);
        }
        square.guessed = true;
        match square.ship {
            Some(kind) => {
                let ship = &mut self.ships[kind.index()];
                ship.hit();
                Ok(ShotOutcome {
                    hit: true,
                    sunk: ship.is_sunk().then_some(kind),
                })
            }
            None => Ok(ShotOutcome {
                hit: false,
                sunk: None,
            }),
        }
    }

    /// Returns `true` when every ship is sunk.
    pub fn all_sunk(&self) -> bool {
        self.ships.iter().all(Ship::is_sunk)
    }
}
