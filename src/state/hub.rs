//! The Hub: shared relay state.
//!
//! One `Hub` exists per relay instance and is shared by every connection task
//! behind an `Arc`. It owns:
//! - the [`SessionRegistry`] (who is online, on which sessions),
//! - one bounded outbound queue per open session,
//! - the [`Authenticator`] and per-session rate limiters,
//! - the shutdown signal.
//!
//! Nothing here performs network I/O. Delivery only enqueues; the connection
//! task that owns a session's socket does the writing.

use super::SessionId;
use super::lifecycle::LifecycleManager;
use super::registry::{BindOutcome, SessionRegistry, UserId};
use crate::config::{Config, LimitsConfig};
use crate::error::{RelayError, RelayResult};
use crate::metrics;
use crate::security::{self, AuthError, Authenticator, RateLimitManager};
use chirp_proto::{ServerEvent, encode_server_event};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// An encoded frame waiting on a session's outbound queue.
pub type Outbound = Arc<str>;

/// What happened to one relayed message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Sessions bound to the receiver when the message was relayed.
    pub targets: usize,
    /// Copies placed on an outbound queue.
    pub queued: usize,
    /// Copies dropped because the session's queue was full.
    pub queue_full: usize,
    /// Copies dropped because the session was already closing.
    pub closing: usize,
}

impl Delivery {
    /// The receiver had no live session.
    pub fn is_offline(&self) -> bool {
        self.targets == 0
    }
}

/// Shared relay state.
pub struct Hub {
    server_name: String,
    registry: SessionRegistry,
    outbound: DashMap<SessionId, mpsc::Sender<Outbound>>,
    authenticator: Arc<dyn Authenticator>,
    rate_limits: RateLimitManager,
    limits: LimitsConfig,
    lifecycle: LifecycleManager,
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("server_name", &self.server_name)
            .field("sessions", &self.outbound.len())
            .field("online_users", &self.registry.online_users())
            .field("authenticator", &self.authenticator.name())
            .finish()
    }
}

impl Hub {
    /// Build a hub from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let authenticator = security::from_config(&config.auth)?;
        Ok(Self::with_authenticator(
            config.server.name.clone(),
            config.limits.clone(),
            authenticator,
        ))
    }

    /// Build a hub with an explicit authenticator.
    pub fn with_authenticator(
        server_name: impl Into<String>,
        limits: LimitsConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            registry: SessionRegistry::new(),
            outbound: DashMap::new(),
            authenticator,
            rate_limits: RateLimitManager::new(&limits),
            limits,
            lifecycle: LifecycleManager::new(),
        }
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn rate_limits(&self) -> &RateLimitManager {
        &self.rate_limits
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Number of open sessions, bound or not.
    pub fn session_count(&self) -> usize {
        self.outbound.len()
    }

    /// Number of users with at least one bound session.
    pub fn online_users(&self) -> usize {
        self.registry.online_users()
    }

    /// Register a freshly opened session and hand back its outbound queue.
    pub fn open_session(&self, session_id: SessionId) -> mpsc::Receiver<Outbound> {
        let (tx, rx) = mpsc::channel(self.limits.send_queue.max(1));
        self.outbound.insert(session_id, tx);
        self.publish_presence();
        rx
    }

    /// Bind a session to `user_id`, enforcing the per-user session limit.
    pub fn bind_session(&self, user_id: &str, session_id: SessionId) -> RelayResult<BindOutcome> {
        let limit = self.limits.max_sessions_per_user;
        let outcome = self
            .registry
            .bind_within(user_id, session_id, limit)
            .ok_or_else(|| RelayError::TooManySessions {
                user_id: user_id.to_owned(),
                limit,
            })?;
        self.publish_presence();
        Ok(outcome)
    }

    /// Release everything held for a session.
    ///
    /// Unbinds it from the registry, drops its outbound queue and its rate
    /// limiter. Returns the user it was bound to. Calling it again for the
    /// same session is a no-op.
    pub fn close_session(&self, session_id: SessionId) -> Option<UserId> {
        let user_id = self.registry.unbind(session_id);
        self.outbound.remove(&session_id);
        self.rate_limits.remove_session(session_id);
        self.publish_presence();
        user_id
    }

    /// Queue `event` on every live session of `user_id` except `origin`.
    ///
    /// Never waits: a session whose queue is full misses this message, and
    /// a user with no live session is not an error. The session a message
    /// came from never receives its own copy.
    pub fn deliver(
        &self,
        user_id: &str,
        event: &ServerEvent,
        origin: Option<SessionId>,
    ) -> RelayResult<Delivery> {
        let frame: Outbound = encode_server_event(event)?.into();
        let mut sessions = self.registry.sessions_for(user_id);
        if let Some(origin) = origin {
            sessions.remove(&origin);
        }
        let mut delivery = Delivery {
            targets: sessions.len(),
            ..Delivery::default()
        };

        for session_id in sessions {
            let Some(tx) = self.outbound.get(&session_id) else {
                delivery.closing += 1;
                continue;
            };
            match tx.try_send(Arc::clone(&frame)) {
                Ok(()) => delivery.queued += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(session_id = %session_id, user_id = %user_id, "outbound queue full, dropping message");
                    delivery.queue_full += 1;
                }
                Err(TrySendError::Closed(_)) => delivery.closing += 1,
            }
        }

        if delivery.is_offline() {
            debug!(user_id = %user_id, "receiver offline, message dropped");
            metrics::record_dropped("offline", 1);
        }
        metrics::record_delivery(delivery.queued, delivery.targets);
        metrics::record_dropped("queue_full", delivery.queue_full);
        metrics::record_dropped("session_closing", delivery.closing);
        Ok(delivery)
    }

    fn publish_presence(&self) {
        metrics::set_presence(self.outbound.len(), self.registry.online_users());
    }
}
