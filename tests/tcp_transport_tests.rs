use battleship_server::transport::tcp::TcpTransport;
use battleship_server::transport::Transport;
use battleship_server::{Message, Notification, Orientation, ShipKind, ShipPlacement};
use tokio::net::TcpListener;
use tokio::time::{timeout, Duration};

async fn connected_pair() -> (TcpTransport, TcpTransport) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpTransport::connect(addr).await.unwrap();
    let (stream, _) = listener.accept().await.unwrap();
    (client, TcpTransport::new(stream))
}

#[tokio::test]
async fn frames_carry_messages_both_ways() {
    let (client, server) = connected_pair().await;
    let (mut client_tx, mut client_rx) = Box::new(client).into_split();
    let (mut server_tx, mut server_rx) = Box::new(server).into_split();

    client_tx
        .send(Message::Board(vec![ShipPlacement {
            kind: ShipKind::Submarine,
            x: 2,
            y: 3,
            orientation: Orientation::Vertical,
        }]))
        .await
        .unwrap();
    client_tx.send(Message::Move { x: 4, y: 9 }).await.unwrap();

    assert_eq!(
        server_rx.recv().await.unwrap(),
        Message::Board(vec![ShipPlacement {
            kind: ShipKind::Submarine,
            x: 2,
            y: 3,
            orientation: Orientation::Vertical,
        }])
    );
    assert_eq!(
        server_rx.recv().await.unwrap(),
        Message::Move { x: 4, y: 9 }
    );

    server_tx
        .send(Message::Notification(Notification::YourTurn))
        .await
        .unwrap();
    assert_eq!(
        client_rx.recv().await.unwrap(),
        Message::Notification(Notification::YourTurn)
    );
}

#[tokio::test]
async fn closing_the_peer_errors_the_reader() {
    let (client, server) = connected_pair().await;
    let (_server_tx, mut server_rx) = Box::new(server).into_split();
    drop(client);

    let err = timeout(Duration::from_secs(2), server_rx.recv())
        .await
        .expect("read should fail promptly")
        .unwrap_err();
    assert!(err.to_string().contains("closed"));
}

#[tokio::test]
async fn oversized_length_prefix_is_rejected() {
    use tokio::io::AsyncWriteExt;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut raw = tokio::net::TcpStream::connect(addr).await.unwrap();
    let (stream, _) = listener.accept().await.unwrap();
    let (_tx, mut rx) = Box::new(TcpTransport::new(stream)).into_split();

    raw.write_all(&u32::MAX.to_be_bytes()).await.unwrap();
    let err = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("read should fail promptly")
        .unwrap_err();
    assert!(err.to_string().contains("too large"));
}
