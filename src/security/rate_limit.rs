//! Rate limiting for flood protection.
//!
//! Uses the `governor` crate's token bucket algorithm. Each session gets its
//! own limiter on first use; limiters are dropped when the session closes.

use crate::config::LimitsConfig;
use crate::state::SessionId;
use dashmap::DashMap;
use governor::{Quota, RateLimiter as GovRateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use tracing::debug;

/// Type alias for governor's direct rate limiter.
type DirectRateLimiter = governor::DefaultDirectRateLimiter;

/// Thread-safe per-session `sendMessage` limiter.
#[derive(Debug)]
pub struct RateLimitManager {
    /// Per-session message rate limiters.
    message_limiters: DashMap<SessionId, DirectRateLimiter>,
    /// `None` when rate limiting is disabled.
    quota: Option<Quota>,
}

impl RateLimitManager {
    /// Create a rate limit manager from the `[limits]` section.
    ///
    /// A `message_rate_per_second` of zero disables limiting.
    pub fn new(limits: &LimitsConfig) -> Self {
        let quota = NonZeroU32::new(limits.message_rate_per_second).map(|rate| {
            let burst = NonZeroU32::new(limits.message_burst)
                .unwrap_or(nonzero!(1u32))
                .max(rate);
            Quota::per_second(rate).allow_burst(burst)
        });
        Self {
            message_limiters: DashMap::new(),
            quota,
        }
    }

    /// Check if a session can send a message.
    ///
    /// Returns `true` if allowed, `false` if rate limited.
    pub fn check_message_rate(&self, session_id: SessionId) -> bool {
        let Some(quota) = self.quota else {
            return true;
        };
        let limiter = self
            .message_limiters
            .entry(session_id)
            .or_insert_with(|| GovRateLimiter::direct(quota));

        let allowed = limiter.check().is_ok();
        if !allowed {
            debug!(session_id = %session_id, "message rate limit exceeded");
        }
        allowed
    }

    /// Remove a session's limiter (on disconnect).
    pub fn remove_session(&self, session_id: SessionId) {
        self.message_limiters.remove(&session_id);
    }

    /// Number of tracked limiters.
    pub fn tracked(&self) -> usize {
        self.message_limiters.len()
    }
}
