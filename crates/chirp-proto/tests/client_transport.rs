//! Client adapter tests against a minimal in-process WebSocket peer.

use chirp_proto::{
    ChatMessage, ClientEvent, JoinRequest, RelayClient, SendMessage, ServerEvent,
    decode_client_event, encode_server_event,
};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Accept one connection, forward every decoded client event to the test,
/// and answer each `sendMessage` with `greeting`.
async fn spawn_peer(greeting: ChatMessage) -> (String, mpsc::Receiver<ClientEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(frame)) = ws.next().await {
            let Message::Text(text) = frame else { break };
            let event = decode_client_event(&text).unwrap();
            let is_send = matches!(event, ClientEvent::SendMessage(_));
            if tx.send(event).await.is_err() {
                break;
            }
            if is_send {
                let out = encode_server_event(&ServerEvent::ReceiveMessage(greeting.clone()))
                    .unwrap();
                ws.send(Message::Text(out)).await.unwrap();
            }
        }
    });

    (format!("ws://{addr}"), rx)
}

fn greeting() -> ChatMessage {
    SendMessage::new("alice", "welcome back")
        .into_chat_message("bob".to_string())
        .unwrap()
}

#[tokio::test]
async fn join_is_the_first_frame() {
    let (url, mut events) = spawn_peer(greeting()).await;
    let client = RelayClient::connect(&url, JoinRequest::claim("alice"))
        .await
        .unwrap();

    let first = timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, ClientEvent::Join(JoinRequest::claim("alice")));
    assert_eq!(client.user_id(), "alice");
    client.close().await;
}

#[tokio::test]
async fn send_stamps_sender_and_timestamp() {
    let (url, mut events) = spawn_peer(greeting()).await;
    let client = RelayClient::connect(&url, JoinRequest::claim("alice"))
        .await
        .unwrap();
    client.send("bob", "hey").await.unwrap();

    let _join = events.recv().await.unwrap();
    let sent = timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    let ClientEvent::SendMessage(msg) = sent else {
        panic!("expected sendMessage, got {sent:?}");
    };
    assert_eq!(msg.sender_id.as_deref(), Some("alice"));
    assert_eq!(msg.receiver_id.as_deref(), Some("bob"));
    assert_eq!(msg.content.as_deref(), Some("hey"));
    assert!(msg.sent_at.is_some());
    client.close().await;
}

#[tokio::test]
async fn inbound_messages_reach_subscribers() {
    let (url, _events) = spawn_peer(greeting()).await;
    let client = RelayClient::connect(&url, JoinRequest::claim("alice"))
        .await
        .unwrap();
    let mut inbox = client.subscribe();
    client.send("bob", "ping").await.unwrap();

    let msg = timeout(Duration::from_secs(5), inbox.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg, greeting());
    client.close().await;
}

#[tokio::test]
async fn close_stops_the_transport_task() {
    let (url, mut events) = spawn_peer(greeting()).await;
    let client = RelayClient::connect(&url, JoinRequest::claim("alice"))
        .await
        .unwrap();
    assert!(client.is_open());
    client.close().await;

    // The peer sees the join and then the end of the stream.
    assert!(matches!(events.recv().await, Some(ClientEvent::Join(_))));
    assert!(timeout(Duration::from_secs(5), events.recv()).await.unwrap().is_none());
}
