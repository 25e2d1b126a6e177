//! Session limits configuration.

use super::defaults::{
    default_max_frame_bytes, default_max_sessions_per_user, default_message_burst,
    default_message_rate_per_second, default_send_queue,
};
use serde::Deserialize;

/// Per-session and per-user limits.
///
/// These keep one misbehaving client from exhausting relay resources or
/// backing up other sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum concurrent sessions bound to one user (default: 16).
    #[serde(default = "default_max_sessions_per_user")]
    pub max_sessions_per_user: usize,
    /// Outbound queue depth per session (default: 256).
    /// Messages for a session whose queue is full are dropped.
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
    /// Sustained `sendMessage` rate per session (default: 20, 0 disables).
    #[serde(default = "default_message_rate_per_second")]
    pub message_rate_per_second: u32,
    /// Burst allowance on top of the sustained rate (default: 40).
    #[serde(default = "default_message_burst")]
    pub message_burst: u32,
    /// Largest accepted inbound frame in bytes (default: 64 KiB).
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions_per_user: default_max_sessions_per_user(),
            send_queue: default_send_queue(),
            message_rate_per_second: default_message_rate_per_second(),
            message_burst: default_message_burst(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}
