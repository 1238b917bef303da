//! End-to-end tests driving `handle_connection` over in-memory transports,
//! exactly as a remote client would over TCP.

use std::sync::Arc;

use battleship_server::transport::in_memory::InMemoryTransport;
use battleship_server::transport::{MessageSink, MessageStream, Transport};
use battleship_server::{
    handle_connection, GameTimeouts, MatchRoom, Message, Notification, Orientation, SessionKey,
    ShipPlacement, FLEET,
};
use tokio::time::{timeout, Duration};

struct Client {
    sink: Box<dyn MessageSink>,
    stream: Box<dyn MessageStream>,
}

impl Client {
    fn connect(room: &Arc<MatchRoom>) -> Client {
        let (client_side, server_side) = InMemoryTransport::pair();
        let room = Arc::clone(room);
        tokio::spawn(async move {
            handle_connection(room, Box::new(server_side)).await;
        });
        let (sink, stream) = Box::new(client_side).into_split();
        Client { sink, stream }
    }

    async fn send(&mut self, msg: Message) {
        self.sink.send(msg).await.unwrap();
    }

    async fn recv(&mut self) -> Message {
        timeout(Duration::from_secs(2), self.stream.recv())
            .await
            .expect("no message within two seconds")
            .expect("connection closed")
    }

    /// Next message, skipping roster pushes triggered by other sessions.
    async fn recv_event(&mut self) -> Message {
        loop {
            match self.recv().await {
                Message::Roster(_) => continue,
                msg => return msg,
            }
        }
    }

    /// Next roster push, skipping everything before it.
    async fn recv_roster(&mut self) -> Vec<battleship_server::RosterEntry> {
        loop {
            if let Message::Roster(entries) = self.recv().await {
                return entries;
            }
        }
    }

    /// Register a name and return this session's key from the roster push.
    async fn join(&mut self, name: &str) -> SessionKey {
        self.send(Message::Name(name.to_string())).await;
        assert_eq!(
            self.recv().await,
            Message::Notification(Notification::NameAccepted)
        );
        let entries = self.recv_roster().await;
        entries
            .iter()
            .find(|e| e.name == name)
            .expect("own roster entry")
            .key
    }
}

fn lobby() -> Arc<MatchRoom> {
    MatchRoom::new(
        GameTimeouts {
            placement: Duration::from_secs(600),
            turn: Duration::from_secs(600),
        },
        Some(5),
    )
}

fn row_fleet() -> Vec<ShipPlacement> {
    FLEET
        .iter()
        .enumerate()
        .map(|(i, &kind)| ShipPlacement {
            kind,
            x: 0,
            y: i as u8,
            orientation: Orientation::Horizontal,
        })
        .collect()
}

/// Connect two clients, pair them through an invitation, and run the
/// placement handshake up to PlaceShips.
async fn paired(room: &Arc<MatchRoom>) -> (Client, Client) {
    let mut alice = Client::connect(room);
    let alice_key = alice.join("alice").await;
    let mut bob = Client::connect(room);
    let bob_key = bob.join("bob").await;

    bob.send(Message::JoinRequest { target: alice_key }).await;
    assert_eq!(
        alice.recv_event().await,
        Message::JoinRequested {
            requester: bob_key,
            name: "bob".to_string(),
        }
    );
    alice
        .send(Message::JoinAccept {
            requester: bob_key,
        })
        .await;

    assert_eq!(
        bob.recv_event().await,
        Message::Notification(Notification::JoinAccepted)
    );
    assert_eq!(
        bob.recv_event().await,
        Message::OpponentsName("alice".to_string())
    );
    assert_eq!(
        bob.recv_event().await,
        Message::Notification(Notification::PlaceShips)
    );
    assert_eq!(
        alice.recv_event().await,
        Message::OpponentsName("bob".to_string())
    );
    assert_eq!(
        alice.recv_event().await,
        Message::Notification(Notification::PlaceShips)
    );
    (alice, bob)
}

#[tokio::test]
async fn name_registration_over_the_wire() {
    let room = lobby();
    let mut client = Client::connect(&room);
    client.send(Message::Name("  ".to_string())).await;
    assert_eq!(
        client.recv().await,
        Message::Notification(Notification::InvalidName)
    );

    client.send(Message::Name("alice".to_string())).await;
    assert_eq!(
        client.recv().await,
        Message::Notification(Notification::NameAccepted)
    );
    let entries = client.recv_roster().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "alice");
}

#[tokio::test]
async fn board_and_move_without_a_game_are_rejected() {
    let room = lobby();
    let mut client = Client::connect(&room);
    client.join("alice").await;

    client.send(Message::Board(row_fleet())).await;
    assert_eq!(
        client.recv_event().await,
        Message::Notification(Notification::NotInGame)
    );

    client.send(Message::Move { x: 0, y: 0 }).await;
    assert_eq!(
        client.recv_event().await,
        Message::Notification(Notification::NotInGame)
    );
}

#[tokio::test]
async fn a_full_game_plays_out_over_the_wire() {
    let room = lobby();
    let (mut alice, mut bob) = paired(&room).await;

    alice.send(Message::Board(row_fleet())).await;
    assert_eq!(
        alice.recv_event().await,
        Message::Notification(Notification::BoardAccepted)
    );
    bob.send(Message::Board(row_fleet())).await;
    assert_eq!(
        bob.recv_event().await,
        Message::Notification(Notification::BoardAccepted)
    );

    // one of them holds the first turn
    let alice_starts = match alice.recv_event().await {
        Message::Notification(Notification::YourTurn) => true,
        Message::Notification(Notification::OpponentsTurn) => false,
        other => panic!("unexpected message: {:?}", other),
    };
    let expected = if alice_starts {
        Notification::OpponentsTurn
    } else {
        Notification::YourTurn
    };
    assert_eq!(bob.recv_event().await, Message::Notification(expected));
    let (mut shooter, mut idle) = if alice_starts {
        (alice, bob)
    } else {
        (bob, alice)
    };

    // both fleets are identical, so sweeping every occupied cell hits
    // every time and the shooter keeps the turn to the end
    let cells: Vec<(u8, u8)> = FLEET
        .iter()
        .enumerate()
        .flat_map(|(i, &kind)| (0..kind.length()).map(move |x| (x, i as u8)))
        .collect();
    let (last, rest) = cells.split_last().unwrap();
    for &(x, y) in rest {
        shooter.send(Message::Move { x, y }).await;
        assert!(matches!(
            shooter.recv_event().await,
            Message::MoveResult { hit: true, own_board: false, .. }
        ));
        assert_eq!(
            shooter.recv_event().await,
            Message::Notification(Notification::YourTurn)
        );
        assert!(matches!(
            idle.recv_event().await,
            Message::MoveResult { hit: true, own_board: true, .. }
        ));
        assert_eq!(
            idle.recv_event().await,
            Message::Notification(Notification::OpponentsTurn)
        );
    }

    shooter.send(Message::Move { x: last.0, y: last.1 }).await;
    assert!(matches!(
        shooter.recv_event().await,
        Message::MoveResult { hit: true, sunk: Some(_), own_board: false, .. }
    ));
    assert_eq!(
        shooter.recv_event().await,
        Message::Notification(Notification::GameWin)
    );
    assert!(matches!(
        idle.recv_event().await,
        Message::MoveResult { hit: true, sunk: Some(_), own_board: true, .. }
    ));
    assert_eq!(
        idle.recv_event().await,
        Message::Notification(Notification::GameLose)
    );

    // the finished game no longer accepts moves
    shooter.send(Message::Move { x: 9, y: 9 }).await;
    assert_eq!(
        shooter.recv_event().await,
        Message::Notification(Notification::NotInGame)
    );
}

#[tokio::test]
async fn chat_reaches_the_opponent() {
    let room = lobby();
    let (mut alice, mut bob) = paired(&room).await;
    alice.send(Message::Chat("good luck".to_string())).await;
    assert_eq!(
        bob.recv_event().await,
        Message::Chat("good luck".to_string())
    );
}

#[tokio::test]
async fn dropping_a_client_notifies_the_opponent() {
    let room = lobby();
    let (mut alice, bob) = paired(&room).await;
    drop(bob);
    assert_eq!(
        alice.recv_event().await,
        Message::Notification(Notification::OpponentDisconnected)
    );
    // alice is back on the roster alone
    let entries = alice.recv_roster().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "alice");
}
