//! Ship definitions and placement geometry.

use serde::{Deserialize, Serialize};

use crate::common::BoardError;
use crate::config::BOARD_SIZE;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// The five ship kinds. Each board carries exactly one ship of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipKind {
    AircraftCarrier,
    Battleship,
    Submarine,
    Destroyer,
    PatrolBoat,
}

impl ShipKind {
    /// Number of squares the ship covers.
    pub const fn length(self) -> u8 {
        match self {
            ShipKind::AircraftCarrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 3,
            ShipKind::PatrolBoat => 2,
        }
    }

    /// Ship's display name.
    pub const fn name(self) -> &'static str {
        match self {
            ShipKind::AircraftCarrier => "aircraft carrier",
            ShipKind::Battleship => "battleship",
            ShipKind::Submarine => "submarine",
            ShipKind::Destroyer => "destroyer",
            ShipKind::PatrolBoat => "patrol boat",
        }
    }

    /// Index of the kind within a board's fleet array.
    pub(crate) const fn index(self) -> usize {
        match self {
            ShipKind::AircraftCarrier => 0,
            ShipKind::Battleship => 1,
            ShipKind::Submarine => 2,
            ShipKind::Destroyer => 3,
            ShipKind::PatrolBoat => 4,
        }
    }
}

/// A declared placement: ship kind, top-left square, orientation. This is
/// the wire form a client submits during the placement phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipPlacement {
    pub kind: ShipKind,
    pub x: u8,
    pub y: u8,
    pub orientation: Orientation,
}

/// A ship on a board. Occupied squares are derived from the origin and
/// orientation rather than stored, so a ship never points back into its
/// board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    kind: ShipKind,
    orientation: Orientation,
    origin: Option<(u8, u8)>,
    health: u8,
}

impl Ship {
    /// Create an unplaced ship at full health.
    pub fn new(kind: ShipKind) -> Self {
        Self {
            kind,
            orientation: Orientation::Horizontal,
            origin: None,
            health: kind.length(),
        }
    }

    pub fn kind(&self) -> ShipKind {
        self.kind
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Top-left square, if the ship has been placed.
    pub fn origin(&self) -> Option<(u8, u8)> {
        self.origin
    }

    pub fn is_placed(&self) -> bool {
        self.origin.is_some()
    }

    pub fn is_sunk(&self) -> bool {
        self.health == 0
    }

    /// Record a hit, decrementing health.
    pub(crate) fn hit(&mut self) {
        self.health = self.health.saturating_sub(1);
    }

    /// Record the placement. The board performs bounds and overlap checks
    /// before calling this.
    pub(crate) fn set_origin(&mut self, x: u8, y: u8, orientation: Orientation) {
        self.origin = Some((x, y));
        self.orientation = orientation;
    }

    /// The squares covered by a placement at (`x`, `y`), or `OutOfBounds`
    /// when any of them would fall off the grid.
    pub fn cells_at(
        kind: ShipKind,
        x: u8,
        y: u8,
        orientation: Orientation,
    ) -> Result<Vec<(u8, u8)>, BoardError> {
        let len = kind.length();
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            return Err(BoardError::OutOfBounds);
        }
        let end = match orientation {
            Orientation::Horizontal => x + len - 1,
            Orientation::Vertical => y + len - 1,
        };
        if end >= BOARD_SIZE {
            return Err(BoardError::OutOfBounds);
        }
        Ok((0..len)
            .map(|i| match orientation {
                Orientation::Horizontal => (x + i, y),
                Orientation::Vertical => (x, y + i),
            })
            .collect())
    }

    /// The squares this ship occupies, empty until placed.
    pub fn cells(&self) -> Vec<(u8, u8)> {
        match self.origin {
            Some((x, y)) => Ship::cells_at(self.kind, x, y, self.orientation)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }
}
