//! TCP accept loop and the per-connection worker.

use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::match_room::MatchRoom;
use crate::protocol::{Message, Notification};
use crate::session::Session;
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;

/// Accept connections forever, spawning one worker per connection. A failed
/// session never takes the server down with it.
pub async fn run(bind: &str, room: Arc<MatchRoom>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(bind).await?;
    info!("listening on {}", listener.local_addr()?);
    loop {
        let (stream, addr) = listener.accept().await?;
        info!("{} connected", addr);
        let room = Arc::clone(&room);
        tokio::spawn(async move {
            handle_connection(room, Box::new(TcpTransport::new(stream))).await;
        });
    }
}

/// Per-connection worker: registers a session, drains its outbox into the
/// transport from a writer task, and dispatches inbound messages until the
/// peer is lost, then runs the disconnect cascade.
pub async fn handle_connection(room: Arc<MatchRoom>, transport: Box<dyn Transport>) {
    let (mut sink, mut stream) = transport.into_split();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel();
    let session = room.register(outbox);

    let writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    loop {
        match stream.recv().await {
            Ok(msg) => dispatch(&room, &session, msg),
            Err(err) => {
                info!("session {}: {}", session.key(), err);
                break;
            }
        }
    }

    room.handle_disconnect(&session);
    writer.abort();
}

fn dispatch(room: &Arc<MatchRoom>, session: &Arc<Session>, msg: Message) {
    match msg {
        Message::Name(name) => room.set_name(session, name),
        Message::JoinRequest { target } => room.send_request(session, target),
        Message::JoinAccept { requester } => room.accept(session, requester),
        Message::JoinReject { requester } => room.reject(session, requester),
        Message::JoinCancel => room.cancel(session),
        Message::Board(placements) => match session.game() {
            Some(game) => game.submit_board(session, &placements),
            None => session.notify(Notification::NotInGame),
        },
        Message::Move { x, y } => match session.game() {
            Some(game) => game.apply_move(session, x, y),
            None => session.notify(Notification::NotInGame),
        },
        Message::Chat(text) => {
            if let Some(game) = session.game() {
                game.relay_chat(session, text);
            }
        }
        other => {
            warn!(
                "session {} sent unexpected message: {:?}",
                session.key(),
                other
            );
        }
    }
}
