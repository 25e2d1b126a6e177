//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

pub fn default_server_name() -> String {
    "chirp.local".to_string()
}

// =============================================================================
// Idle Timeout Defaults
// =============================================================================

pub fn default_ping_interval() -> u64 {
    30
}

pub fn default_ping_timeout() -> u64 {
    60
}

pub fn default_join_timeout() -> u64 {
    60
}

// =============================================================================
// Auth Defaults
// =============================================================================

pub fn default_token_ttl() -> u64 {
    30 * 86400
}

// =============================================================================
// Limits Defaults
// =============================================================================

pub fn default_max_sessions_per_user() -> usize {
    16
}

pub fn default_send_queue() -> usize {
    256
}

pub fn default_message_rate_per_second() -> u32 {
    20
}

pub fn default_message_burst() -> u32 {
    40
}

pub fn default_max_frame_bytes() -> usize {
    64 * 1024
}
