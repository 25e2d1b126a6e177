//! Security module for chirp-relay.
//!
//! Provides the relay's trust boundary:
//! - **Authentication**: pluggable identity resolution for `join` and `sendMessage`
//! - **Tokens**: HMAC-SHA256 signed bearer tokens
//! - **Rate Limiting**: Governor-based flood protection per session
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 Security Module                  │
//! ├────────────────┬────────────────┬────────────────┤
//! │ Authenticator  │  TokenSigner   │ Rate Limiting  │
//! │ Trust / Token  │  HMAC-SHA256   │   Governor     │
//! │ join + sender  │ issue + verify │ Token Bucket   │
//! └────────────────┴────────────────┴────────────────┘
//! ```

pub mod auth;
pub mod rate_limit;
pub mod token;

pub use auth::{AuthError, Authenticator, TokenAuthenticator, TrustClaimed, from_config};
pub use rate_limit::RateLimitManager;
pub use token::TokenSigner;
