//! Identity verification configuration.

use super::defaults::default_token_ttl;
use serde::Deserialize;

/// How the relay decides who a session is.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Believe the identity the client claims in `join` and `sendMessage`.
    #[default]
    Trust,
    /// Require a signed bearer token on `join`; `sendMessage` must come
    /// from the bound identity.
    Token,
}

/// `[auth]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// HMAC secret shared with the token issuer. Required for `token` mode.
    pub secret: Option<String>,
    /// Lifetime of issued tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            secret: None,
            token_ttl: default_token_ttl(),
        }
    }
}
