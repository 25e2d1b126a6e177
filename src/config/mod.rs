//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, IdleTimeoutsConfig)
//! - [`listen`]: Network listener configuration (ListenConfig, TlsConfig)
//! - [`auth`]: Identity verification on the real-time channel (AuthConfig)
//! - [`limits`]: Per-session and per-user limits (LimitsConfig)
//! - [`validation`]: Startup validation

mod auth;
mod defaults;
mod limits;
mod listen;
mod types;
pub mod validation;

pub use auth::{AuthConfig, AuthMode};
pub use limits::LimitsConfig;
pub use listen::{ListenConfig, TlsConfig};
pub use types::{Config, ConfigError, IdleTimeoutsConfig, LogFormat, ServerConfig};
pub use validation::{ValidationError, validate};
