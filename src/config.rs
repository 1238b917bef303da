use tokio::time::Duration;

use crate::ship::ShipKind;

pub const BOARD_SIZE: u8 = 10;
pub const NUM_SHIPS: usize = 5;
pub const FLEET: [ShipKind; NUM_SHIPS] = [
    ShipKind::AircraftCarrier,
    ShipKind::Battleship,
    ShipKind::Submarine,
    ShipKind::Destroyer,
    ShipKind::PatrolBoat,
];

/// Deadlines enforced by the per-game watchdogs. Fixed for the lifetime of
/// the process; the CLI may override the defaults at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameTimeouts {
    pub placement: Duration,
    pub turn: Duration,
}

impl Default for GameTimeouts {
    fn default() -> Self {
        Self {
            placement: Duration::from_secs(120),
            turn: Duration::from_secs(60),
        }
    }
}
