//! Unified error handling for chirp-relay.
//!
//! Every client event either succeeds or fails with a [`RelayError`]. Errors
//! are logged and counted, never sent back to the client, and never end the
//! session.

use crate::security::AuthError;
use crate::state::Phase;
use chirp_proto::ProtocolError;
use thiserror::Error;

// ============================================================================
// Relay Errors (event processing)
// ============================================================================

/// Errors that can occur while handling a client event.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("invalid message: {0}")]
    InvalidMessage(#[from] ProtocolError),

    #[error("user {user_id} already has {limit} sessions")]
    TooManySessions { user_id: String, limit: usize },

    #[error("message rate limit exceeded")]
    RateLimited,

    #[error("cannot {action} a session in phase {from:?}")]
    InvalidTransition { from: Phase, action: &'static str },
}

impl RelayError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(e) => e.code(),
            Self::InvalidMessage(e) => e.code(),
            Self::TooManySessions { .. } => "too_many_sessions",
            Self::RateLimited => "rate_limited",
            Self::InvalidTransition { .. } => "invalid_transition",
        }
    }
}

/// Result type for event handlers.
pub type RelayResult<T = ()> = Result<T, RelayError>;
