mod board;
mod common;
mod config;
mod game;
mod logging;
mod match_room;
pub mod protocol;
mod server;
mod session;
mod ship;
pub mod transport;

pub use board::*;
pub use common::*;
pub use config::*;
pub use game::*;
pub use logging::init_logging;
pub use match_room::*;
pub use protocol::*;
pub use server::*;
pub use session::*;
pub use ship::*;
