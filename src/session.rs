//! Per-connection identity and outbound-message facade.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::game::Game;
use crate::protocol::{Message, Notification, SessionKey};

#[derive(Default)]
struct SessionState {
    name: Option<String>,
    game: Option<Arc<Game>>,
}

/// One connected player: a server-assigned key, the chosen display name,
/// membership in at most one game, and a non-blocking outbound queue drained
/// by the connection's writer task.
pub struct Session {
    key: SessionKey,
    outbox: mpsc::UnboundedSender<Message>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(key: SessionKey, outbox: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            key,
            outbox,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    /// Queue a message for the client. A closed queue means the connection
    /// is already gone; the reader side handles the disconnect cascade, so
    /// the failure is dropped here.
    pub fn send(&self, msg: Message) {
        let _ = self.outbox.send(msg);
    }

    pub fn notify(&self, code: Notification) {
        self.send(Message::Notification(code));
    }

    pub fn name(&self) -> Option<String> {
        self.state.lock().expect("session lock poisoned").name.clone()
    }

    pub fn set_name(&self, name: String) {
        self.state.lock().expect("session lock poisoned").name = Some(name);
    }

    pub fn game(&self) -> Option<Arc<Game>> {
        self.state.lock().expect("session lock poisoned").game.clone()
    }

    pub fn set_game(&self, game: Arc<Game>) {
        self.state.lock().expect("session lock poisoned").game = Some(game);
    }

    pub fn clear_game(&self) {
        self.state.lock().expect("session lock poisoned").game = None;
    }

    pub fn in_game(&self) -> bool {
        self.state.lock().expect("session lock poisoned").game.is_some()
    }
}
