//! The lobby: key assignment, name registration, the roster of unpaired
//! players, and the invitation graph that pairs sessions into games.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::GameTimeouts;
use crate::game::Game;
use crate::protocol::{Message, Notification, RosterEntry, SessionKey};
use crate::session::Session;

struct RoomInner {
    next_key: SessionKey,
    sessions: HashMap<SessionKey, Arc<Session>>,
    /// Directed invitations. A requester has at most one outstanding edge;
    /// a target may hold edges from many requesters.
    outgoing: HashMap<SessionKey, SessionKey>,
    incoming: HashMap<SessionKey, HashSet<SessionKey>>,
    /// Seeds the per-game turn-assignment source.
    rng: SmallRng,
}

/// Lobby registry shared by every connection worker. All roster and
/// invitation mutations happen under one lock, so racing operations on the
/// same edge (accept vs cancel, simultaneous requests) serialize cleanly.
pub struct MatchRoom {
    timeouts: GameTimeouts,
    /// Self-handle passed to games so they can re-announce the roster when
    /// they end.
    handle: Weak<MatchRoom>,
    inner: Mutex<RoomInner>,
}

impl MatchRoom {
    pub fn new(timeouts: GameTimeouts, seed: Option<u64>) -> Arc<MatchRoom> {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };
        Arc::new_cyclic(|handle| MatchRoom {
            timeouts,
            handle: handle.clone(),
            inner: Mutex::new(RoomInner {
                next_key: 1,
                sessions: HashMap::new(),
                outgoing: HashMap::new(),
                incoming: HashMap::new(),
                rng,
            }),
        })
    }

    /// Admit a new connection: assign a process-unique key and track the
    /// session until it disconnects.
    pub fn register(&self, outbox: tokio::sync::mpsc::UnboundedSender<Message>) -> Arc<Session> {
        let mut inner = self.lock_inner();
        let key = inner.next_key;
        inner.next_key += 1;
        let session = Arc::new(Session::new(key, outbox));
        inner.sessions.insert(key, Arc::clone(&session));
        info!("session {} connected", key);
        session
    }

    /// Register a display name: empty names are invalid, names already held
    /// by another session are taken. Acceptance is broadcast via the roster.
    pub fn set_name(&self, session: &Arc<Session>, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            session.notify(Notification::InvalidName);
            return;
        }
        let inner = self.lock_inner();
        let taken = inner
            .sessions
            .values()
            .any(|s| s.key() != session.key() && s.name().as_deref() == Some(name.as_str()));
        if taken {
            session.notify(Notification::NameTaken);
            return;
        }
        session.set_name(name.clone());
        session.notify(Notification::NameAccepted);
        info!("session {} is now named {:?}", session.key(), name);
        self.broadcast_roster(&inner);
    }

    /// Named sessions not currently in a game.
    pub fn roster(&self) -> Vec<RosterEntry> {
        Self::roster_entries(&self.lock_inner())
    }

    /// Push the current roster to every lobby member. Games call this when
    /// they end and their players rejoin the lobby.
    pub fn publish_roster(&self) {
        self.broadcast_roster(&self.lock_inner());
    }

    fn roster_entries(inner: &RoomInner) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = inner
            .sessions
            .values()
            .filter(|s| !s.in_game())
            .filter_map(|s| {
                s.name().map(|name| RosterEntry { key: s.key(), name })
            })
            .collect();
        entries.sort_by_key(|e| e.key);
        entries
    }

    fn broadcast_roster(&self, inner: &RoomInner) {
        let entries = Self::roster_entries(inner);
        for session in inner.sessions.values() {
            if !session.in_game() {
                session.send(Message::Roster(entries.clone()));
            }
        }
    }

    /// Send a directed invitation. A requester may hold at most one
    /// outstanding invitation, may not target itself, and both sides must be
    /// in the lobby.
    pub fn send_request(&self, requester: &Arc<Session>, target_key: SessionKey) {
        let mut inner = self.lock_inner();
        let requester_name = match requester.name() {
            Some(name) => name,
            None => {
                requester.notify(Notification::InvalidName);
                return;
            }
        };
        if inner.outgoing.contains_key(&requester.key()) {
            requester.notify(Notification::RequestAlreadyPending);
            return;
        }
        if target_key == requester.key() || requester.in_game() {
            requester.notify(Notification::GameNotFound);
            return;
        }
        let target = match inner.sessions.get(&target_key) {
            Some(target) if target.name().is_some() && !target.in_game() => Arc::clone(target),
            _ => {
                requester.notify(Notification::GameNotFound);
                return;
            }
        };
        inner.outgoing.insert(requester.key(), target_key);
        inner
            .incoming
            .entry(target_key)
            .or_default()
            .insert(requester.key());
        info!(
            "session {} invited session {}",
            requester.key(),
            target_key
        );
        target.send(Message::JoinRequested {
            requester: requester.key(),
            name: requester_name,
        });
    }

    /// Accept an invitation: remove the edge, clear every other invitation
    /// involving either party, and hand the pair off to a new game.
    pub fn accept(&self, target: &Arc<Session>, requester_key: SessionKey) {
        let mut inner = self.lock_inner();
        let edge_exists = inner
            .incoming
            .get(&target.key())
            .is_some_and(|set| set.contains(&requester_key));
        let requester = match inner.sessions.get(&requester_key) {
            Some(requester) if edge_exists && !requester.in_game() && !target.in_game() => {
                Arc::clone(requester)
            }
            _ => {
                target.notify(Notification::GameNotFound);
                return;
            }
        };
        Self::remove_edge(&mut inner, requester_key, target.key());
        requester.notify(Notification::JoinAccepted);

        // entering a game invalidates every other pending invitation
        Self::reject_all_locked(&mut inner, target.key());
        Self::reject_all_locked(&mut inner, requester_key);
        Self::cancel_locked(&mut inner, target.key());

        let game_rng = SmallRng::from_rng(&mut inner.rng);
        Game::start(
            [requester, Arc::clone(target)],
            self.timeouts,
            game_rng,
            self.handle.clone(),
        );
        self.broadcast_roster(&inner);
    }

    /// Reject an invitation from `requester_key`, notifying the requester.
    pub fn reject(&self, target: &Arc<Session>, requester_key: SessionKey) {
        let mut inner = self.lock_inner();
        let edge_exists = inner
            .incoming
            .get(&target.key())
            .is_some_and(|set| set.contains(&requester_key));
        if !edge_exists {
            return;
        }
        Self::remove_edge(&mut inner, requester_key, target.key());
        if let Some(requester) = inner.sessions.get(&requester_key) {
            requester.notify(Notification::JoinRejected);
        }
    }

    /// Withdraw the requester's outstanding invitation, notifying its
    /// target.
    pub fn cancel(&self, requester: &Arc<Session>) {
        let mut inner = self.lock_inner();
        Self::cancel_locked(&mut inner, requester.key());
    }

    /// Reject every invitation targeting `session`. Used on disconnect and
    /// when a session enters a game, so no invite is left dangling.
    pub fn reject_all(&self, session: &Session) {
        let mut inner = self.lock_inner();
        Self::reject_all_locked(&mut inner, session.key());
    }

    /// Connection-loss cascade: remove the session from the lobby, drop all
    /// invitations involving it, and tear down its game if any. The game
    /// handle is read under the room lock so a racing `accept` cannot pair
    /// the session into a fresh game after it has been removed.
    pub fn handle_disconnect(&self, session: &Arc<Session>) {
        let mut inner = self.lock_inner();
        inner.sessions.remove(&session.key());
        Self::cancel_locked(&mut inner, session.key());
        Self::reject_all_locked(&mut inner, session.key());
        if let Some(game) = session.game() {
            game.handle_disconnect(session);
        }
        info!("session {} disconnected", session.key());
        self.broadcast_roster(&inner);
    }

    fn remove_edge(inner: &mut RoomInner, requester_key: SessionKey, target_key: SessionKey) {
        inner.outgoing.remove(&requester_key);
        if let Some(set) = inner.incoming.get_mut(&target_key) {
            set.remove(&requester_key);
            if set.is_empty() {
                inner.incoming.remove(&target_key);
            }
        }
    }

    fn reject_all_locked(inner: &mut RoomInner, target_key: SessionKey) {
        let requesters = match inner.incoming.remove(&target_key) {
            Some(requesters) => requesters,
            None => return,
        };
        for requester_key in requesters {
            inner.outgoing.remove(&requester_key);
            if let Some(requester) = inner.sessions.get(&requester_key) {
                requester.notify(Notification::JoinRejected);
            }
        }
    }

    fn cancel_locked(inner: &mut RoomInner, requester_key: SessionKey) {
        let target_key = match inner.outgoing.remove(&requester_key) {
            Some(target_key) => target_key,
            None => return,
        };
        if let Some(set) = inner.incoming.get_mut(&target_key) {
            set.remove(&requester_key);
            if set.is_empty() {
                inner.incoming.remove(&target_key);
            }
        }
        if let Some(target) = inner.sessions.get(&target_key) {
            target.send(Message::JoinCancelled {
                requester: requester_key,
            });
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, RoomInner> {
        self.inner.lock().expect("match room lock poisoned")
    }
}
