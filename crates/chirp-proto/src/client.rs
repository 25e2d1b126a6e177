//! Client transport adapter.
//!
//! [`RelayClient`] is the counterpart the UI layer talks to: it opens one
//! WebSocket session, immediately binds the local identity with `join`,
//! exposes [`RelayClient::send`] for outbound messages and
//! [`RelayClient::subscribe`] for inbound ones.
//!
//! ```ignore
//! use chirp_proto::{JoinRequest, RelayClient};
//!
//! let client = RelayClient::connect("ws://127.0.0.1:8000", JoinRequest::claim("alice")).await?;
//! let mut inbox = client.subscribe();
//! client.send("bob", "hey").await?;
//! while let Ok(msg) = inbox.recv().await {
//!     println!("{}: {}", msg.sender_id, msg.content);
//! }
//! ```

use crate::codec::{decode_server_event, encode_client_event};
use crate::error::ProtocolError;
use crate::event::{ChatMessage, ClientEvent, JoinRequest, SendMessage, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Inbound messages buffered per subscriber before it starts lagging.
const INBOX_CAPACITY: usize = 256;

/// Outbound events queued before `send` starts waiting.
const OUTBOX_CAPACITY: usize = 64;

/// Errors surfaced by the client adapter.
#[derive(Debug, Error)]
pub enum ClientError {
    /// WebSocket handshake or I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    /// A frame could not be encoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// The session has already been closed.
    #[error("session closed")]
    Closed,
}

enum Outbound {
    Event(ClientEvent),
    Close,
}

/// A live session with the relay, bound to one local identity.
pub struct RelayClient {
    user_id: String,
    outbound: mpsc::Sender<Outbound>,
    inbound: broadcast::Sender<ChatMessage>,
    task: JoinHandle<()>,
}

impl RelayClient {
    /// Open a session to `url` and emit `join` with the given identity.
    pub async fn connect(url: &str, join: JoinRequest) -> Result<Self, ClientError> {
        Self::connect_request(url, join).await
    }

    /// Like [`RelayClient::connect`], accepting a prepared handshake request
    /// (for example one carrying an `Origin` header).
    pub async fn connect_request<R>(request: R, join: JoinRequest) -> Result<Self, ClientError>
    where
        R: IntoClientRequest + Unpin,
    {
        let (ws, _response) = connect_async(request).await?;
        let (mut sink, mut stream) = ws.split();

        let user_id = join.user_id.clone();
        let frame = encode_client_event(&ClientEvent::Join(join))?;
        sink.send(Message::Text(frame)).await?;

        let (outbound, mut outbound_rx) = mpsc::channel::<Outbound>(OUTBOX_CAPACITY);
        let (inbound, _) = broadcast::channel::<ChatMessage>(INBOX_CAPACITY);
        let inbound_tx = inbound.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    out = outbound_rx.recv() => {
                        let event = match out {
                            Some(Outbound::Event(event)) => event,
                            Some(Outbound::Close) | None => {
                                let _ = sink.send(Message::Close(None)).await;
                                break;
                            }
                        };
                        let frame = match encode_client_event(&event) {
                            Ok(frame) => frame,
                            Err(e) => {
                                warn!(error = %e, "failed to encode outbound event");
                                continue;
                            }
                        };
                        if let Err(e) = sink.send(Message::Text(frame)).await {
                            debug!(error = %e, "write failed, closing session");
                            break;
                        }
                    }
                    frame = stream.next() => {
                        match frame {
                            Some(Ok(Message::Text(text))) => match decode_server_event(&text) {
                                Ok(ServerEvent::ReceiveMessage(msg)) => {
                                    // No subscribers is fine; the message is simply unobserved.
                                    let _ = inbound_tx.send(msg);
                                }
                                Err(e) => warn!(error = %e, "ignoring undecodable frame"),
                            },
                            Some(Ok(Message::Close(_))) | None => break,
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                debug!(error = %e, "read failed, closing session");
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            user_id,
            outbound,
            inbound,
            task,
        })
    }

    /// The identity this session joined as.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Subscribe to inbound `receiveMessage` events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatMessage> {
        self.inbound.subscribe()
    }

    /// Send `content` to `receiver_id`, stamped with this identity and the
    /// current time.
    pub async fn send(
        &self,
        receiver_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ClientError> {
        let msg = SendMessage::new(receiver_id, content)
            .with_sender(self.user_id.clone())
            .with_sent_at(chrono::Utc::now().to_rfc3339());
        self.send_event(ClientEvent::SendMessage(msg)).await
    }

    /// Queue an arbitrary client event.
    pub async fn send_event(&self, event: ClientEvent) -> Result<(), ClientError> {
        self.outbound
            .send(Outbound::Event(event))
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// Whether the underlying transport task is still running.
    pub fn is_open(&self) -> bool {
        !self.task.is_finished()
    }

    /// Close the session and wait for the transport task to finish.
    pub async fn close(self) {
        let _ = self.outbound.send(Outbound::Close).await;
        let _ = self.task.await;
    }
}
