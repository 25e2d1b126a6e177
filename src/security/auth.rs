//! Identity resolution for the real-time channel.
//!
//! The relay never decides on its own who a session is. Every `join` and
//! every `sendMessage` goes through an [`Authenticator`], so swapping the
//! trusting default for token verification does not touch the handlers.

use super::token::TokenSigner;
use crate::config::{AuthConfig, AuthMode};
use async_trait::async_trait;
use chirp_proto::JoinRequest;
use std::sync::Arc;
use thiserror::Error;

/// Reasons an identity claim is refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("join requires a token")]
    MissingToken,
    #[error("malformed token")]
    MalformedToken,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("identity mismatch: session is {bound}, claimed {claimed}")]
    IdentityMismatch { bound: String, claimed: String },
    #[error("session has not joined")]
    NotBound,
    #[error("no sender identity")]
    MissingIdentity,
    #[error("token secret is not configured")]
    MissingSecret,
}

impl AuthError {
    /// Static code for metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::MalformedToken => "malformed_token",
            Self::BadSignature => "bad_signature",
            Self::Expired => "token_expired",
            Self::IdentityMismatch { .. } => "identity_mismatch",
            Self::NotBound => "not_bound",
            Self::MissingIdentity => "missing_identity",
            Self::MissingSecret => "missing_secret",
        }
    }
}

/// Resolves identity claims made by a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Turn a `join` payload into the user id the session is bound to.
    async fn resolve_join(&self, request: &JoinRequest) -> Result<String, AuthError>;

    /// Decide the effective sender of a `sendMessage`.
    ///
    /// `bound` is the identity the session joined as, `claimed` is the
    /// `senderId` the client put in the message.
    fn resolve_sender(&self, bound: Option<&str>, claimed: Option<&str>)
    -> Result<String, AuthError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Believes whatever identity the client claims.
///
/// This is how the web client has always behaved: `join` binds the given
/// id and `senderId` is taken at face value.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustClaimed;

#[async_trait]
impl Authenticator for TrustClaimed {
    async fn resolve_join(&self, request: &JoinRequest) -> Result<String, AuthError> {
        Ok(request.user_id.clone())
    }

    fn resolve_sender(
        &self,
        bound: Option<&str>,
        claimed: Option<&str>,
    ) -> Result<String, AuthError> {
        claimed
            .filter(|id| !id.is_empty())
            .or(bound)
            .map(str::to_owned)
            .ok_or(AuthError::MissingIdentity)
    }

    fn name(&self) -> &'static str {
        "trust"
    }
}

/// Requires a signed token on `join` and pins senders to the bound identity.
#[derive(Debug)]
pub struct TokenAuthenticator {
    signer: TokenSigner,
}

impl TokenAuthenticator {
    pub fn new(signer: TokenSigner) -> Self {
        Self { signer }
    }

    /// The signer, for issuing tokens alongside verification.
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn resolve_join(&self, request: &JoinRequest) -> Result<String, AuthError> {
        let token = request.token.as_deref().ok_or(AuthError::MissingToken)?;
        let user_id = self.signer.verify(token)?;
        if user_id != request.user_id {
            return Err(AuthError::IdentityMismatch {
                bound: user_id,
                claimed: request.user_id.clone(),
            });
        }
        Ok(user_id)
    }

    fn resolve_sender(
        &self,
        bound: Option<&str>,
        claimed: Option<&str>,
    ) -> Result<String, AuthError> {
        let bound = bound.ok_or(AuthError::NotBound)?;
        match claimed {
            Some(claimed) if !claimed.is_empty() && claimed != bound => {
                Err(AuthError::IdentityMismatch {
                    bound: bound.to_owned(),
                    claimed: claimed.to_owned(),
                })
            }
            _ => Ok(bound.to_owned()),
        }
    }

    fn name(&self) -> &'static str {
        "token"
    }
}

/// Build the authenticator selected by `[auth]`.
pub fn from_config(config: &AuthConfig) -> Result<Arc<dyn Authenticator>, AuthError> {
    match config.mode {
        AuthMode::Trust => Ok(Arc::new(TrustClaimed)),
        AuthMode::Token => {
            let secret = config.secret.as_deref().ok_or(AuthError::MissingSecret)?;
            let signer = TokenSigner::new(secret.as_bytes(), config.token_ttl)?;
            Ok(Arc::new(TokenAuthenticator::new(signer)))
        }
    }
}
