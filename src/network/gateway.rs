//! Gateway - TCP/TLS listener that accepts incoming WebSocket sessions.
//!
//! The Gateway binds one socket, performs the optional TLS handshake and the
//! WebSocket upgrade (with CORS origin checks), then spawns a
//! [`Connection`] task per session.

use crate::config::{Config, IdleTimeoutsConfig, ListenConfig, TlsConfig};
use crate::network::Connection;
use crate::state::Hub;
use rustls_pemfile::{certs, pkcs8_private_keys};
use std::io::{BufReader, Cursor};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, info, instrument, warn};

/// Upper bound on TLS plus WebSocket handshake time.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a spawned session task needs besides its socket.
#[derive(Clone)]
struct SessionParams {
    hub: Arc<Hub>,
    listen: Arc<ListenConfig>,
    idle: IdleTimeoutsConfig,
    ws_config: WebSocketConfig,
}

/// The Gateway accepts incoming TCP/TLS connections and spawns sessions.
pub struct Gateway {
    listener: TcpListener,
    tls: Option<TlsAcceptor>,
    params: SessionParams,
}

impl Gateway {
    /// Bind the gateway to `listen.address`.
    pub async fn bind(config: &Config, hub: Arc<Hub>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.listen.address).await?;
        let tls = config.tls.as_ref().map(Self::load_tls).transpose()?;
        info!(
            address = %listener.local_addr()?,
            tls = tls.is_some(),
            "WebSocket listener bound"
        );

        // Frames over max_frame_bytes are refused per event; this hard cap
        // only stops pathological frames from being buffered at all.
        let hard_cap = config.limits.max_frame_bytes.saturating_mul(4).max(64 * 1024);
        let ws_config = WebSocketConfig {
            max_message_size: Some(hard_cap),
            max_frame_size: Some(hard_cap),
            ..WebSocketConfig::default()
        };

        Ok(Self {
            listener,
            tls,
            params: SessionParams {
                hub,
                listen: Arc::new(config.listen.clone()),
                idle: config.server.idle_timeouts.clone(),
                ws_config,
            },
        })
    }

    /// The address actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Load TLS certificates and create TlsAcceptor.
    fn load_tls(config: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
        // Load certificates
        let cert_file = std::fs::read(&config.cert_path)?;
        let cert_reader = &mut BufReader::new(Cursor::new(cert_file));
        let certs: Vec<CertificateDer> = certs(cert_reader).collect::<Result<Vec<_>, _>>()?;

        if certs.is_empty() {
            anyhow::bail!("No certificates found in {}", config.cert_path);
        }

        // Load private key
        let key_file = std::fs::read(&config.key_path)?;
        let key_reader = &mut BufReader::new(Cursor::new(key_file));
        let key = pkcs8_private_keys(key_reader)
            .next()
            .transpose()?
            .map(PrivateKeyDer::from)
            .ok_or_else(|| anyhow::anyhow!("No private keys found in {}", config.key_path))?;

        let tls_config = ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)?;

        Ok(TlsAcceptor::from(Arc::new(tls_config)))
    }

    /// Accept sessions until the Hub signals shutdown.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let mut shutdown = self.params.hub.lifecycle().subscribe();
        if self.params.hub.lifecycle().is_shutting_down() {
            info!("gateway stopping");
            return Ok(());
        }
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.spawn_session(stream, addr),
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                },
                _ = shutdown.recv() => {
                    info!("gateway stopping");
                    return Ok(());
                }
            }
        }
    }

    fn spawn_session(&self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%addr, error = %e, "set_nodelay failed");
        }
        let params = self.params.clone();
        let tls = self.tls.clone();

        tokio::spawn(async move {
            match tls {
                Some(acceptor) => {
                    match tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                        Ok(Ok(tls_stream)) => upgrade(tls_stream, addr, params).await,
                        Ok(Err(e)) => warn!(%addr, error = %e, "TLS handshake failed"),
                        Err(_) => warn!(%addr, "TLS handshake timed out"),
                    }
                }
                None => upgrade(stream, addr, params).await,
            }
        });
    }
}

/// Perform the WebSocket upgrade with CORS validation and run the session.
async fn upgrade<S>(stream: S, addr: SocketAddr, params: SessionParams)
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let listen = Arc::clone(&params.listen);
    let cors_callback = move |req: &Request, response: Response| {
        let origin = req
            .headers()
            .get(http::header::ORIGIN)
            .and_then(|o| o.to_str().ok());
        if listen.origin_allowed(origin) {
            return Ok(response);
        }
        warn!(%addr, origin = origin.unwrap_or("<none>"), "WebSocket CORS rejected");
        let mut rejection = ErrorResponse::new(Some("CORS origin not allowed".to_string()));
        *rejection.status_mut() = http::StatusCode::FORBIDDEN;
        Err(rejection)
    };

    let handshake = accept_hdr_async_with_config(stream, cors_callback, Some(params.ws_config));
    let ws = match tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => {
            warn!(%addr, error = %e, "WebSocket handshake failed");
            return;
        }
        Err(_) => {
            warn!(%addr, "WebSocket handshake timed out");
            return;
        }
    };

    Connection::new(ws, addr, params.hub, params.idle).run().await;
}
