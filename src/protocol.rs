//! Wire protocol: one message enum for both directions, exchanged as
//! length-prefixed bincode frames by the transport layer.

use serde::{Deserialize, Serialize};

use crate::ship::{ShipKind, ShipPlacement};

/// Opaque server-assigned session identifier, unique for the process
/// lifetime.
pub type SessionKey = u64;

/// One lobby roster line: a named, unpaired session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub key: SessionKey,
    pub name: String,
}

/// Messages exchanged between the server and a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    // client -> server
    /// Register or change the session's display name.
    Name(String),
    /// Invite another session to a game.
    JoinRequest { target: SessionKey },
    /// Accept an invitation from `requester`.
    JoinAccept { requester: SessionKey },
    /// Reject an invitation from `requester`.
    JoinReject { requester: SessionKey },
    /// Withdraw this session's outstanding invitation.
    JoinCancel,
    /// Submit a fleet layout during the placement phase.
    Board(Vec<ShipPlacement>),
    /// Fire at the opponent's board. Valid only while holding the turn.
    Move { x: u8, y: u8 },
    /// Chat text, relayed verbatim to the opponent.
    Chat(String),

    // server -> client
    /// A status code with no payload.
    Notification(Notification),
    /// The paired opponent's display name.
    OpponentsName(String),
    /// Another session has invited this one to a game.
    JoinRequested { requester: SessionKey, name: String },
    /// A previously received invitation was withdrawn.
    JoinCancelled { requester: SessionKey },
    /// Current lobby roster of named, unpaired sessions.
    Roster(Vec<RosterEntry>),
    /// Result of an accepted move, sent to both players. `own_board` tells
    /// the receiver which of its two views the shot landed on.
    MoveResult {
        x: u8,
        y: u8,
        hit: bool,
        sunk: Option<ShipKind>,
        own_board: bool,
    },
}

/// Server-to-client status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    InvalidName,
    NameTaken,
    NameAccepted,
    GameNotFound,
    RequestAlreadyPending,
    JoinAccepted,
    JoinRejected,
    PlaceShips,
    BoardAccepted,
    InvalidBoard,
    NotInGame,
    YourTurn,
    OpponentsTurn,
    NotYourTurn,
    InvalidMove,
    RepeatedMove,
    GameWin,
    GameLose,
    TimeoutWin,
    TimeoutLose,
    TimeoutDraw,
    OpponentDisconnected,
}
