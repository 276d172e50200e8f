//! Stateless access tokens.
//!
//! A token is a [`Principal`] serialised to JSON and sealed with
//! XChaCha20-Poly1305 under a process-wide key. Nothing is persisted: the
//! token carries its own expiry, and verification needs only the key and
//! the current time. There is no revocation; a leaked token stays usable
//! until `expires_at`.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{KDF_CONTEXT_TOKEN_KEY, MIN_TOKEN_SECRET_LEN, TOKEN_PREFIX};
use crate::crypto::{self, SymmetricKey};
use crate::error::TokenError;

/// The identity a verified token vouches for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Random per-token identifier.
    pub id: Uuid,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    fn new(
        username: &str,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, TokenError> {
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidTtl)?;
        Ok(Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            issued_at: now,
            expires_at,
        })
    }

    /// A principal stays valid up to and including `expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Issues and verifies access tokens.
///
/// Holds only the read-only key, so one instance can be shared across any
/// number of concurrent requests.
#[derive(Clone)]
pub struct TokenService {
    key: SymmetricKey,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(key: SymmetricKey) -> Self {
        Self { key }
    }

    /// Build a service from operator-supplied secret material.
    pub fn from_secret(secret: &str) -> Result<Self, TokenError> {
        if secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(TokenError::WeakKey {
                min: MIN_TOKEN_SECRET_LEN,
                got: secret.len(),
            });
        }
        Ok(Self::new(crypto::derive_key(
            secret.as_bytes(),
            KDF_CONTEXT_TOKEN_KEY,
        )))
    }

    pub fn issue(&self, username: &str, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(username, ttl, Utc::now()).map(|(token, _)| token)
    }

    /// Issue a token as of `now`, returning it together with the sealed
    /// principal.
    pub fn issue_at(
        &self,
        username: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<(String, Principal), TokenError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| TokenError::InvalidTtl)?;
        if ttl <= chrono::Duration::zero() {
            return Err(TokenError::InvalidTtl);
        }

        let principal = Principal::new(username, ttl, now)?;
        let payload = serde_json::to_vec(&principal).map_err(|_| TokenError::Seal)?;
        let sealed = crypto::seal(&self.key, &payload).map_err(|_| TokenError::Seal)?;

        let token = format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(sealed));
        Ok((token, principal))
    }

    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, TokenError> {
        let body = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(TokenError::Malformed)?;
        let sealed = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|_| TokenError::Malformed)?;
        let payload = crypto::open(&self.key, &sealed).map_err(|_| TokenError::Malformed)?;
        let principal: Principal =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if !principal.is_valid_at(now) {
            return Err(TokenError::Expired);
        }
        Ok(principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_symmetric_key;

    const MINUTE: Duration = Duration::from_secs(60);

    fn service() -> TokenService {
        TokenService::new(generate_symmetric_key())
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = service();
        let now = Utc::now();
        let (token, issued) = tokens.issue_at("alice", MINUTE, now).unwrap();

        let principal = tokens.verify_at(&token, now).unwrap();
        assert_eq!(principal, issued);
        assert_eq!(principal.username, "alice");
        assert_eq!(
            principal.expires_at - principal.issued_at,
            chrono::Duration::seconds(60)
        );
    }

    #[test]
    fn test_wall_clock_roundtrip() {
        let tokens = service();
        let token = tokens.issue("bob", MINUTE).unwrap();
        assert_eq!(tokens.verify(&token).unwrap().username, "bob");
    }

    #[test]
    fn test_expiry_boundary() {
        let tokens = service();
        let now = Utc::now();
        let (token, _) = tokens.issue_at("alice", MINUTE, now).unwrap();

        assert!(tokens
            .verify_at(&token, now + chrono::Duration::seconds(59))
            .is_ok());
        assert!(tokens
            .verify_at(&token, now + chrono::Duration::seconds(60))
            .is_ok());
        assert_eq!(
            tokens.verify_at(&token, now + chrono::Duration::seconds(61)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_wrong_key_is_malformed() {
        let issuer = service();
        let other = service();
        let token = issuer.issue("alice", MINUTE).unwrap();

        assert_eq!(other.verify(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_corrupted_byte_is_malformed() {
        let tokens = service();
        let token = tokens.issue("alice", MINUTE).unwrap();

        let body = token.strip_prefix(TOKEN_PREFIX).unwrap();
        let mut sealed = URL_SAFE_NO_PAD.decode(body).unwrap();
        for i in [0, sealed.len() / 2, sealed.len() - 1] {
            sealed[i] ^= 0x01;
            let corrupted = format!("{TOKEN_PREFIX}{}", URL_SAFE_NO_PAD.encode(&sealed));
            assert_eq!(tokens.verify(&corrupted), Err(TokenError::Malformed));
            sealed[i] ^= 0x01;
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = service();
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("v1.local.!!!"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify("v1.local.AAAA"), Err(TokenError::Malformed));
    }

    #[test]
    fn test_each_token_gets_a_fresh_id() {
        let tokens = service();
        let now = Utc::now();
        let (a, pa) = tokens.issue_at("alice", MINUTE, now).unwrap();
        let (b, pb) = tokens.issue_at("alice", MINUTE, now).unwrap();
        assert_ne!(a, b);
        assert_ne!(pa.id, pb.id);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let tokens = service();
        assert_eq!(
            tokens.issue("alice", Duration::ZERO),
            Err(TokenError::InvalidTtl)
        );
    }

    #[test]
    fn test_ttl_past_the_calendar_rejected() {
        let tokens = service();
        let centuries = Duration::from_secs(300_000 * 31_557_600);
        assert_eq!(
            tokens.issue("alice", centuries),
            Err(TokenError::InvalidTtl)
        );
        assert_eq!(
            tokens.issue("alice", Duration::from_secs(u64::MAX)),
            Err(TokenError::InvalidTtl)
        );
    }

    #[test]
    fn test_from_secret() {
        assert!(matches!(
            TokenService::from_secret("short"),
            Err(TokenError::WeakKey { min: 32, got: 5 })
        ));

        let secret = "12345678901234567890123456789012";
        let a = TokenService::from_secret(secret).unwrap();
        let b = TokenService::from_secret(secret).unwrap();
        let token = a.issue("carol", MINUTE).unwrap();
        assert_eq!(b.verify(&token).unwrap().username, "carol");
    }
}
