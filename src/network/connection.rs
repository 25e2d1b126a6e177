//! Connection - one task per WebSocket session.
//!
//! The task owns the socket. It reads client frames and handles them in
//! order, writes frames queued for the session by the Hub, pings idle peers
//! and listens for server shutdown. Whatever ends the loop, the
//! [`SessionGuard`] releases the session's shared state exactly once.

use crate::config::IdleTimeoutsConfig;
use crate::handlers::{self, Context};
use crate::metrics;
use crate::state::{Hub, Outbound, Session, SessionId};
use crate::telemetry::spans;
use chirp_proto::ProtocolError;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{Instrument, debug, info, warn};

/// Why a session's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame or the stream ended.
    ClientClosed,
    /// Reading from or writing to the socket failed.
    TransportError,
    /// No `join` within the join timeout.
    JoinTimeout,
    /// No traffic, not even a pong, within ping + timeout.
    IdleTimeout,
    /// The server is shutting down.
    Shutdown,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::TransportError => "transport_error",
            Self::JoinTimeout => "join_timeout",
            Self::IdleTimeout => "idle_timeout",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Releases a session's shared state when dropped.
struct SessionGuard {
    hub: Arc<Hub>,
    session_id: SessionId,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(user_id) = self.hub.close_session(self.session_id) {
            debug!(session_id = %self.session_id, user_id = %user_id, "session unbound");
        }
    }
}

/// A single client session over an established WebSocket.
pub struct Connection<S> {
    ws: WebSocketStream<S>,
    session: Session,
    hub: Arc<Hub>,
    idle: IdleTimeoutsConfig,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(ws: WebSocketStream<S>, addr: SocketAddr, hub: Arc<Hub>, idle: IdleTimeoutsConfig) -> Self {
        Self {
            ws,
            session: Session::new(addr),
            hub,
            idle,
        }
    }

    /// Run the session until it closes.
    pub async fn run(self) -> CloseReason {
        let span = spans::connection(self.session.id(), self.session.remote_addr());
        self.serve().instrument(span).await
    }

    async fn serve(self) -> CloseReason {
        let Self {
            ws,
            mut session,
            hub,
            idle,
        } = self;

        let outbound = hub.open_session(session.id());
        let guard = SessionGuard {
            hub: Arc::clone(&hub),
            session_id: session.id(),
        };
        info!("session opened");

        let (reason, sink) = event_loop(ws, &mut session, &hub, &idle, outbound).await;

        // Shared state is released before the close handshake.
        if let Err(e) = session.close() {
            warn!(error = %e, "session already closed");
        }
        drop(guard);

        if let Some(mut sink) = sink {
            let _ = tokio::time::timeout(Duration::from_secs(1), sink.close()).await;
        }
        info!(reason = reason.as_str(), "session closed");
        reason
    }
}

type WsSink<S> = futures_util::stream::SplitSink<WebSocketStream<S>, Message>;

async fn event_loop<S>(
    ws: WebSocketStream<S>,
    session: &mut Session,
    hub: &Hub,
    idle: &IdleTimeoutsConfig,
    mut outbound: mpsc::Receiver<Outbound>,
) -> (CloseReason, Option<WsSink<S>>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let (mut sink, mut stream) = ws.split();
    let mut shutdown = hub.lifecycle().subscribe();
    if hub.lifecycle().is_shutting_down() {
        return (CloseReason::Shutdown, Some(sink));
    }

    // Deadlines past what `Instant` can represent mean "never".
    let ping_after = Duration::from_secs(idle.ping);
    let close_after = Duration::from_secs(idle.ping.saturating_add(idle.timeout));
    let join_deadline = (idle.join > 0)
        .then(|| Instant::now().checked_add(Duration::from_secs(idle.join)))
        .flatten();

    let mut last_seen = Instant::now();
    let mut ping_sent = false;

    loop {
        let keepalive = last_seen.checked_add(if ping_sent { close_after } else { ping_after });
        let awaiting_join = session.user_id().is_none();

        tokio::select! {
            frame = stream.next() => {
                let message = match frame {
                    None => return (CloseReason::ClientClosed, None),
                    Some(Err(e)) => {
                        debug!(error = %e, "read failed");
                        return (CloseReason::TransportError, None);
                    }
                    Some(Ok(message)) => message,
                };
                last_seen = Instant::now();
                ping_sent = false;

                match message {
                    Message::Text(text) => {
                        let mut ctx = Context::new(hub, session);
                        if let Err(e) = handlers::handle_frame(&mut ctx, &text).await {
                            report(event_name(&text), &e);
                        }
                    }
                    Message::Binary(_) => {
                        report("binary", &ProtocolError::BinaryFrame.into());
                    }
                    Message::Close(_) => return (CloseReason::ClientClosed, Some(sink)),
                    // Pongs are queued by the transport itself.
                    Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
                }
            }

            Some(frame) = outbound.recv() => {
                if let Err(e) = sink.send(Message::Text(frame.to_string())).await {
                    debug!(error = %e, "write failed");
                    return (CloseReason::TransportError, None);
                }
            }

            _ = sleep_until(keepalive.unwrap_or(last_seen)), if keepalive.is_some() => {
                if ping_sent {
                    info!("idle timeout");
                    return (CloseReason::IdleTimeout, Some(sink));
                }
                if let Err(e) = sink.send(Message::Ping(Vec::new())).await {
                    debug!(error = %e, "ping failed");
                    return (CloseReason::TransportError, None);
                }
                ping_sent = true;
            }

            _ = sleep_until(join_deadline.unwrap_or(last_seen)), if awaiting_join && join_deadline.is_some() => {
                info!("no join before deadline");
                return (CloseReason::JoinTimeout, Some(sink));
            }

            _ = shutdown.recv() => {
                return (CloseReason::Shutdown, Some(sink));
            }
        }
    }
}

/// Log and count a dropped event. Nothing is sent back to the client.
fn report(event: &'static str, error: &crate::error::RelayError) {
    metrics::record_event_error(event, error.error_code());
    match error {
        crate::error::RelayError::RateLimited => debug!(event, error = %error, "event dropped"),
        _ => warn!(event, code = error.error_code(), error = %error, "event dropped"),
    }
}

/// Best-effort event label for a frame that may not have decoded.
fn event_name(text: &str) -> &'static str {
    if text.contains("\"sendMessage\"") {
        "sendMessage"
    } else if text.contains("\"join\"") {
        "join"
    } else {
        "unknown"
    }
}
