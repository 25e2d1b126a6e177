//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{AuthMode, Config};
use std::path::Path;
use thiserror::Error;

/// Shortest HMAC secret accepted for token mode, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted idle timeout, in seconds (one week).
pub const MAX_IDLE_TIMEOUT_SECS: u64 = 7 * 24 * 3600;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("server.name is required")]
    MissingServerName,
    #[error("tls.cert_path does not exist: {0}")]
    TlsCertNotFound(String),
    #[error("tls.key_path does not exist: {0}")]
    TlsKeyNotFound(String),
    #[error("auth.secret is required when auth.mode = \"token\"")]
    MissingAuthSecret,
    #[error("auth.secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    WeakAuthSecret(usize),
    #[error("auth.token_ttl must be greater than zero")]
    ZeroTokenTtl,
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("server.idle_timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("server.idle_timeouts.{0} must be at most {MAX_IDLE_TIMEOUT_SECS} seconds, got {1}")]
    TimeoutTooLarge(&'static str, u64),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.name.is_empty() {
        errors.push(ValidationError::MissingServerName);
    }

    let idle = &config.server.idle_timeouts;
    if idle.ping == 0 {
        errors.push(ValidationError::ZeroTimeout("ping"));
    }
    if idle.timeout == 0 {
        errors.push(ValidationError::ZeroTimeout("timeout"));
    }
    for (name, secs) in [("ping", idle.ping), ("timeout", idle.timeout), ("join", idle.join)] {
        if secs > MAX_IDLE_TIMEOUT_SECS {
            errors.push(ValidationError::TimeoutTooLarge(name, secs));
        }
    }

    // TLS validation
    if let Some(ref tls) = config.tls {
        if !Path::new(&tls.cert_path).exists() {
            errors.push(ValidationError::TlsCertNotFound(tls.cert_path.clone()));
        }
        if !Path::new(&tls.key_path).exists() {
            errors.push(ValidationError::TlsKeyNotFound(tls.key_path.clone()));
        }
    }

    // Auth validation
    if config.auth.mode == AuthMode::Token {
        match config.auth.secret.as_deref() {
            None | Some("") => errors.push(ValidationError::MissingAuthSecret),
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                errors.push(ValidationError::WeakAuthSecret(secret.len()));
            }
            Some(_) => {}
        }
        if config.auth.token_ttl == 0 {
            errors.push(ValidationError::ZeroTokenTtl);
        }
    }

    // Limits validation
    let limits = &config.limits;
    if limits.max_sessions_per_user == 0 {
        errors.push(ValidationError::ZeroLimit("max_sessions_per_user"));
    }
    if limits.send_queue == 0 {
        errors.push(ValidationError::ZeroLimit("send_queue"));
    }
    if limits.max_frame_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_frame_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
