//! The turn-based state machine for one paired session: placement phase,
//! turn loop with hit/miss/sink resolution, win detection, and the placement
//! and turn watchdogs.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::info;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::board::Board;
use crate::config::{GameTimeouts, BOARD_SIZE};
use crate::match_room::MatchRoom;
use crate::protocol::{Message, Notification};
use crate::session::Session;
use crate::ship::ShipPlacement;

/// Lifecycle phase of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingBoards,
    InProgress,
    Finished,
}

struct GameInner {
    phase: Phase,
    boards: [Option<Board>; 2],
    turn: Option<usize>,
    /// Watchdog generations. Arming a watchdog captures the current value;
    /// a fired callback that observes a newer generation is stale and must
    /// no-op. Bumping a generation is therefore the cancel operation.
    placement_gen: u64,
    turn_gen: u64,
    rng: SmallRng,
}

/// One game between two sessions. All mutable state sits behind a single
/// mutex, serializing both players' submissions, moves, and watchdog
/// callbacks against each other. The lock is never held across an await:
/// outbound messages are queue pushes.
pub struct Game {
    players: [Arc<Session>; 2],
    timeouts: GameTimeouts,
    /// Self-handle for the watchdog tasks.
    handle: Weak<Game>,
    /// The lobby to inform when the game ends and both players return to it.
    room: Weak<MatchRoom>,
    inner: Mutex<GameInner>,
}

impl Game {
    /// Pair two sessions into a new game: attach it to both, tell each the
    /// opponent's name, open the placement phase and arm its watchdog.
    ///
    /// The random source decides the starting turn; it is injected so tests
    /// can make it deterministic. `room` is the lobby to re-announce the
    /// roster to once the game ends; callers without one pass `Weak::new()`.
    pub fn start(
        players: [Arc<Session>; 2],
        timeouts: GameTimeouts,
        rng: SmallRng,
        room: Weak<MatchRoom>,
    ) -> Arc<Game> {
        let game = Arc::new_cyclic(|handle| Game {
            players,
            timeouts,
            handle: handle.clone(),
            room,
            inner: Mutex::new(GameInner {
                phase: Phase::AwaitingBoards,
                boards: [None, None],
                turn: None,
                placement_gen: 0,
                turn_gen: 0,
                rng,
            }),
        });
        for (idx, player) in game.players.iter().enumerate() {
            player.set_game(Arc::clone(&game));
            let opponent_name = game.players[1 - idx].name().unwrap_or_default();
            player.send(Message::OpponentsName(opponent_name));
            player.notify(Notification::PlaceShips);
        }
        info!(
            "game started: {} vs {}",
            game.players[0].key(),
            game.players[1].key()
        );
        game.arm_placement_watchdog(0);
        game
    }

    fn player_index(&self, session: &Session) -> Option<usize> {
        self.players.iter().position(|p| p.key() == session.key())
    }

    /// The other player in the game.
    pub fn opponent_of(&self, session: &Session) -> Option<Arc<Session>> {
        self.player_index(session)
            .map(|idx| Arc::clone(&self.players[1 - idx]))
    }

    pub fn phase(&self) -> Phase {
        self.lock_inner().phase
    }

    /// Process a fleet submission during the placement phase. An invalid
    /// layout is reported back and may be resubmitted; once both players
    /// have accepted boards the turn loop begins with a random holder.
    pub fn submit_board(&self, session: &Session, placements: &[ShipPlacement]) {
        let idx = match self.player_index(session) {
            Some(idx) => idx,
            None => return,
        };
        let mut inner = self.lock_inner();
        if inner.phase != Phase::AwaitingBoards {
            session.notify(Notification::InvalidBoard);
            return;
        }
        let board = match Board::from_placements(placements) {
            Ok(board) => board,
            Err(err) => {
                info!("session {}: invalid board: {}", session.key(), err);
                session.notify(Notification::InvalidBoard);
                return;
            }
        };
        inner.boards[idx] = Some(board);
        session.notify(Notification::BoardAccepted);

        if inner.boards.iter().all(Option::is_some) {
            // cancel the placement watchdog and open the turn loop
            inner.placement_gen += 1;
            inner.phase = Phase::InProgress;
            let start = inner.rng.random_range(0..2);
            self.set_turn(&mut inner, start);
        }
    }

    /// Grant the turn to `idx`, re-arming the turn watchdog and notifying
    /// both players.
    fn set_turn(&self, inner: &mut GameInner, idx: usize) {
        inner.turn = Some(idx);
        inner.turn_gen += 1;
        self.arm_turn_watchdog(inner.turn_gen);
        self.players[idx].notify(Notification::YourTurn);
        self.players[1 - idx].notify(Notification::OpponentsTurn);
    }

    /// Apply a move from `session`. Rejections (not your turn, out of
    /// bounds, repeated square) are notifications only and leave all state,
    /// including the turn watchdog, untouched.
    pub fn apply_move(&self, session: &Session, x: u8, y: u8) {
        let idx = match self.player_index(session) {
            Some(idx) => idx,
            None => return,
        };
        let mut inner = self.lock_inner();

        if inner.turn != Some(idx) {
            session.notify(Notification::NotYourTurn);
            return;
        }
        if x >= BOARD_SIZE || y >= BOARD_SIZE {
            session.notify(Notification::InvalidMove);
            return;
        }
        let opponent_board = match inner.boards[1 - idx].as_mut() {
            Some(board) => board,
            None => return,
        };
        if opponent_board.is_guessed(x, y) {
            session.notify(Notification::RepeatedMove);
            return;
        }
        let outcome = match opponent_board.apply_shot(x, y) {
            Ok(outcome) => outcome,
            Err(_) => return,
        };
        info!(
            "shot: {} -> {} at ({}, {}): hit={} sunk={:?}",
            session.key(),
            self.players[1 - idx].key(),
            x,
            y,
            outcome.hit,
            outcome.sunk
        );

        // acting player's update first, then the board owner's
        session.send(Message::MoveResult {
            x,
            y,
            hit: outcome.hit,
            sunk: outcome.sunk,
            own_board: false,
        });
        self.players[1 - idx].send(Message::MoveResult {
            x,
            y,
            hit: outcome.hit,
            sunk: outcome.sunk,
            own_board: true,
        });

        let fleet_destroyed = inner.boards[1 - idx]
            .as_ref()
            .map(Board::all_sunk)
            .unwrap_or(false);
        if fleet_destroyed {
            // win resolution comes before the extra-turn-on-hit rule, so the
            // sinking shot never re-arms a turn
            session.notify(Notification::GameWin);
            self.players[1 - idx].notify(Notification::GameLose);
            self.finish(&mut inner);
            drop(inner);
            self.publish_lobby();
        } else if outcome.hit {
            // extra turn on hit
            self.set_turn(&mut inner, idx);
        } else {
            self.set_turn(&mut inner, 1 - idx);
        }
    }

    /// Relay a chat line verbatim to the opponent.
    pub fn relay_chat(&self, session: &Session, text: String) {
        if let Some(opponent) = self.opponent_of(session) {
            opponent.send(Message::Chat(text));
        }
    }

    /// Tear down the game because `session`'s connection was lost. The
    /// room broadcasts the roster as part of its own disconnect cascade, so
    /// the lobby is not re-announced here.
    pub fn handle_disconnect(&self, session: &Session) {
        let mut inner = self.lock_inner();
        if inner.phase == Phase::Finished {
            return;
        }
        if let Some(opponent) = self.opponent_of(session) {
            opponent.notify(Notification::OpponentDisconnected);
        }
        info!("session {} left, game torn down", session.key());
        self.finish(&mut inner);
    }

    /// Terminal transition: clear the turn, invalidate all pending
    /// watchdogs, and detach both sessions.
    fn finish(&self, inner: &mut GameInner) {
        inner.phase = Phase::Finished;
        inner.turn = None;
        inner.placement_gen += 1;
        inner.turn_gen += 1;
        for player in &self.players {
            player.clear_game();
        }
    }

    /// Re-announce the roster now that both players are back in the lobby.
    /// Callers must have released the game lock first: the roster broadcast
    /// takes the room lock, and the room may call into games it holds.
    fn publish_lobby(&self) {
        if let Some(room) = self.room.upgrade() {
            room.publish_roster();
        }
    }

    fn arm_placement_watchdog(&self, gen: u64) {
        let game = match self.handle.upgrade() {
            Some(game) => game,
            None => return,
        };
        tokio::spawn(async move {
            tokio::time::sleep(game.timeouts.placement).await;
            game.placement_expired(gen);
        });
    }

    fn arm_turn_watchdog(&self, gen: u64) {
        let game = match self.handle.upgrade() {
            Some(game) => game,
            None => return,
        };
        tokio::spawn(async move {
            tokio::time::sleep(game.timeouts.turn).await;
            game.turn_expired(gen);
        });
    }

    /// Placement watchdog callback. Stale generations no-op: the deadline
    /// was cancelled by both boards arriving or the game ending first.
    fn placement_expired(&self, gen: u64) {
        let mut inner = self.lock_inner();
        if inner.phase != Phase::AwaitingBoards || gen != inner.placement_gen {
            return;
        }
        info!(
            "placement deadline expired: {} vs {}",
            self.players[0].key(),
            self.players[1].key()
        );
        match (&inner.boards[0], &inner.boards[1]) {
            (None, None) => {
                self.players[0].notify(Notification::TimeoutDraw);
                self.players[1].notify(Notification::TimeoutDraw);
            }
            (Some(_), None) => {
                self.players[0].notify(Notification::TimeoutWin);
                self.players[1].notify(Notification::TimeoutLose);
            }
            (None, Some(_)) => {
                self.players[0].notify(Notification::TimeoutLose);
                self.players[1].notify(Notification::TimeoutWin);
            }
            (Some(_), Some(_)) => return,
        }
        self.finish(&mut inner);
        drop(inner);
        self.publish_lobby();
    }

    /// Turn watchdog callback. Stale generations no-op: a move was accepted
    /// or the game ended before the deadline fired.
    fn turn_expired(&self, gen: u64) {
        let mut inner = self.lock_inner();
        if inner.phase != Phase::InProgress || gen != inner.turn_gen {
            return;
        }
        let idx = match inner.turn {
            Some(idx) => idx,
            None => return,
        };
        info!("turn deadline expired for session {}", self.players[idx].key());
        self.players[idx].notify(Notification::TimeoutLose);
        self.players[1 - idx].notify(Notification::TimeoutWin);
        self.finish(&mut inner);
        drop(inner);
        self.publish_lobby();
    }

    fn lock_inner(&self) -> MutexGuard<'_, GameInner> {
        self.inner.lock().expect("game lock poisoned")
    }
}
