//! HMAC-SHA256 signed bearer tokens.
//!
//! A token has three dot-separated parts:
//!
//! ```text
//! base64url(user_id) "." expiry_unix_seconds "." base64url(hmac)
//! ```
//!
//! The MAC covers the first two parts exactly as they appear in the token.
//! The REST side of the application issues tokens with the same secret; the
//! relay only verifies them.

use super::auth::AuthError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

#[derive(Zeroize, ZeroizeOnDrop)]
struct SecretKey(Vec<u8>);

/// Issues and verifies bearer tokens with a shared secret.
pub struct TokenSigner {
    key: SecretKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer. `ttl_secs` is the lifetime of tokens from [`issue`](Self::issue).
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Ok(Self {
            key: SecretKey(secret.to_vec()),
            ttl,
        })
    }

    /// Issue a token for `user_id` expiring after the configured lifetime.
    pub fn issue(&self, user_id: &str) -> Result<String, AuthError> {
        let expires = Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.issue_until(user_id, expires)
    }

    /// Issue a token for `user_id` expiring at `expires`.
    pub fn issue_until(&self, user_id: &str, expires: DateTime<Utc>) -> Result<String, AuthError> {
        let payload = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(user_id.as_bytes()),
            expires.timestamp()
        );
        let mac = self.sign(&payload)?;
        Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(mac)))
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as of `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let (payload, mac_b64) = token.rsplit_once('.').ok_or(AuthError::MalformedToken)?;
        let (user_b64, expiry) = payload.split_once('.').ok_or(AuthError::MalformedToken)?;

        let provided = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|_| AuthError::MalformedToken)?;
        let expected = self.sign(payload)?;
        if !bool::from(expected.ct_eq(provided.as_slice())) {
            return Err(AuthError::BadSignature);
        }

        let expiry: i64 = expiry.parse().map_err(|_| AuthError::MalformedToken)?;
        if now.timestamp() >= expiry {
            return Err(AuthError::Expired);
        }

        let user = URL_SAFE_NO_PAD
            .decode(user_b64)
            .map_err(|_| AuthError::MalformedToken)?;
        let user = String::from_utf8(user).map_err(|_| AuthError::MalformedToken)?;
        if user.is_empty() {
            return Err(AuthError::MalformedToken);
        }
        Ok(user)
    }

    fn sign(&self, payload: &str) -> Result<Vec<u8>, AuthError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key.0).map_err(|_| AuthError::MissingSecret)?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn signer() -> TokenSigner {
        TokenSigner::new(TEST_SECRET, 3600).unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let signer = signer();
        let token = signer.issue("alice").unwrap();
        assert_eq!(signer.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn user_ids_with_dots_survive() {
        let signer = signer();
        let token = signer.issue("alice.smith@example.com").unwrap();
        assert_eq!(signer.verify(&token).unwrap(), "alice.smith@example.com");
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = signer().issue("alice").unwrap();
        let other = TokenSigner::new(b"another-secret-another-secret-xx", 3600).unwrap();
        assert_eq!(other.verify(&token), Err(AuthError::BadSignature));
    }

    #[test]
    fn tampered_user_is_rejected() {
        let signer = signer();
        let token = signer.issue("alice").unwrap();
        let forged = token.replacen(
            &URL_SAFE_NO_PAD.encode("alice"),
            &URL_SAFE_NO_PAD.encode("mallory"),
            1,
        );
        assert_eq!(signer.verify(&forged), Err(AuthError::BadSignature));
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let now = Utc::now();
        let token = signer
            .issue_until("alice", now - Duration::seconds(1))
            .unwrap();
        assert_eq!(signer.verify_at(&token, now), Err(AuthError::Expired));
    }

    #[test]
    fn token_valid_until_expiry() {
        let signer = signer();
        let now = Utc::now();
        let token = signer
            .issue_until("alice", now + Duration::seconds(10))
            .unwrap();
        assert!(signer.verify_at(&token, now).is_ok());
        assert_eq!(
            signer.verify_at(&token, now + Duration::seconds(10)),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        let signer = signer();
        assert_eq!(signer.verify(""), Err(AuthError::MalformedToken));
        assert_eq!(signer.verify("no-dots"), Err(AuthError::MalformedToken));
        assert_eq!(signer.verify("a.b"), Err(AuthError::MalformedToken));
        assert_eq!(signer.verify("a.b.!!!"), Err(AuthError::MalformedToken));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            TokenSigner::new(b"", 60),
            Err(AuthError::MissingSecret)
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let rendered = format!("{:?}", signer());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("0123456789abcdef"));
    }
}
