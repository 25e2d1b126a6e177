//! Test WebSocket client.
//!
//! Speaks the relay's JSON frames directly so tests can send malformed or
//! hand-crafted payloads as well as well-formed events.

use chirp_proto::{ChatMessage, ClientEvent, JoinRequest, SendMessage, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// A raw test client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Connect to a test relay.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws, _) = connect_async(url).await?;
        Ok(Self { ws })
    }

    /// Connect with an explicit `Origin` header.
    #[allow(dead_code)]
    pub async fn connect_with_origin(url: &str, origin: &str) -> anyhow::Result<Self> {
        let mut request = url.into_client_request()?;
        request
            .headers_mut()
            .insert(http::header::ORIGIN, http::HeaderValue::from_str(origin)?);
        let (ws, _) = connect_async(request).await?;
        Ok(Self { ws })
    }

    /// Send a raw text frame.
    pub async fn send_raw(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a client event.
    pub async fn send(&mut self, event: &ClientEvent) -> anyhow::Result<()> {
        let frame = chirp_proto::encode_client_event(event)?;
        self.send_raw(&frame).await
    }

    /// Bind this session with a bare `join`.
    pub async fn join(&mut self, user_id: &str) -> anyhow::Result<()> {
        self.send(&ClientEvent::Join(JoinRequest::claim(user_id)))
            .await
    }

    /// Send a chat message with an explicit sender.
    pub async fn send_message(&mut self, from: &str, to: &str, content: &str) -> anyhow::Result<()> {
        let msg = SendMessage::new(to, content).with_sender(from);
        self.send(&ClientEvent::SendMessage(msg)).await
    }

    /// Receive a single message from the relay.
    pub async fn recv(&mut self) -> anyhow::Result<ChatMessage> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a message with a timeout, skipping control frames.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<ChatMessage> {
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let frame = timeout(remaining, self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            match frame {
                Message::Text(text) => {
                    let ServerEvent::ReceiveMessage(msg) = chirp_proto::decode_server_event(&text)?;
                    return Ok(msg);
                }
                Message::Close(_) => anyhow::bail!("connection closed"),
                _ => continue,
            }
        }
    }

    /// Raw text of the next data frame.
    #[allow(dead_code)]
    pub async fn recv_text(&mut self) -> anyhow::Result<String> {
        loop {
            let frame = timeout(Duration::from_secs(5), self.ws.next())
                .await?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))??;
            match frame {
                Message::Text(text) => return Ok(text),
                Message::Close(_) => anyhow::bail!("connection closed"),
                _ => continue,
            }
        }
    }

    /// Assert nothing arrives within `dur`.
    #[allow(dead_code)]
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(msg) => anyhow::bail!("unexpected message: {msg:?}"),
            Err(e) if e.is::<tokio::time::error::Elapsed>() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Wait for the relay to close this session.
    #[allow(dead_code)]
    pub async fn wait_closed(&mut self, dur: Duration) -> anyhow::Result<()> {
        timeout(dur, async {
            while let Some(frame) = self.ws.next().await {
                match frame {
                    Ok(Message::Close(_)) | Err(_) => return,
                    Ok(_) => {}
                }
            }
        })
        .await
        .map_err(|_| anyhow::anyhow!("session still open after {dur:?}"))
    }

    /// Close the session.
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
