//! Common types: board errors and shot outcomes.

use crate::ship::ShipKind;

/// Outcome of a shot applied to a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotOutcome {
    /// Whether a ship occupies the targeted square.
    pub hit: bool,
    /// The ship sunk by this shot, if any.
    pub sunk: Option<ShipKind>,
}

/// Errors returned by Board operations.
#[derive(Debug, PartialEq, Eq)]
pub enum BoardError {
    /// Placement or shot coordinates fall outside the grid.
    OutOfBounds,
    /// Ship placement overlaps another ship.
    ShipOverlaps,
    /// Attempted to place a ship that is already placed.
    ShipAlreadyPlaced,
    /// A fleet submission did not contain exactly one ship per kind.
    IncompleteFleet,
    /// Shot was already made at this position.
    AlreadyGuessed,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BoardError::OutOfBounds => write!(f, "Coordinates are out of bounds"),
            BoardError::ShipOverlaps => write!(f, "Ship placement overlaps with another ship"),
            BoardError::ShipAlreadyPlaced => write!(f, "Ship is already placed on the board"),
            BoardError::IncompleteFleet => write!(f, "Fleet must contain exactly one ship per kind"),
            BoardError::AlreadyGuessed => write!(f, "Shot was already made at this position"),
        }
    }
}

impl std::error::Error for BoardError {}
