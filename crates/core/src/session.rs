//! Opaque bearer-token sessions for the mobile client.
//!
//! Tokens are 256-bit random values sent to the client as hex; only the
//! SHA-256 digest is persisted, so a database leak does not compromise
//! active sessions. Sessions expire after a configurable TTL (24 hours
//! by default) and are deleted lazily when an expired token is
//! presented -- a subsequent attempt with the same token reports
//! `Invalid`, not `Expired`.

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::store::{SessionStore, StoreError};
use crate::types::{DbId, Timestamp};

/// Default session lifetime in hours.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// A persisted mobile session. Holds the token digest, never the token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token_hash: String,
    pub user_id: DbId,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

/// A freshly issued session, carrying the plaintext token exactly once.
#[derive(Debug)]
pub struct IssuedSession {
    /// The plaintext token to hand to the client. Not stored anywhere.
    pub token: String,
    pub session: Session,
}

/// Why a token failed validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No session matches the presented token.
    #[error("invalid token")]
    Invalid,

    /// The session existed but its expiry has passed. The stored record
    /// has been deleted.
    #[error("expired token")]
    Expired,

    /// The session store itself failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Generate a cryptographically random session token (256 bits, hex).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute the SHA-256 hex digest of a token for storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issues, validates, and revokes mobile sessions against a [`SessionStore`].
pub struct SessionService<S> {
    store: S,
    ttl: Duration,
}

impl<S: SessionStore> SessionService<S> {
    pub fn new(store: S, ttl_hours: i64) -> Self {
        Self {
            store,
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Issue a new session for the user. Additive: earlier sessions for
    /// the same user stay valid.
    pub async fn issue(&self, user_id: DbId) -> Result<IssuedSession, StoreError> {
        let token = generate_token();
        let now = Utc::now();
        let session = Session {
            token_hash: hash_token(&token),
            user_id,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        self.store.insert(&session).await?;
        tracing::info!(user_id, expires_at = %session.expires_at, "Issued mobile session");
        Ok(IssuedSession { token, session })
    }

    /// Validate a presented token.
    ///
    /// An expired session is deleted on detection, so retrying with the
    /// same token reports [`AuthError::Invalid`].
    pub async fn validate(&self, token: &str) -> Result<Session, AuthError> {
        let hash = hash_token(token);
        let session = self
            .store
            .find_by_token_hash(&hash)
            .await?
            .ok_or(AuthError::Invalid)?;

        if Utc::now() >= session.expires_at {
            self.store.delete_by_token_hash(&hash).await?;
            tracing::debug!(user_id = session.user_id, "Removed expired mobile session");
            return Err(AuthError::Expired);
        }

        Ok(session)
    }

    /// Revoke a session. No-op (and no error) if the token is unknown.
    pub async fn revoke(&self, token: &str) -> Result<bool, StoreError> {
        self.store.delete_by_token_hash(&hash_token(token)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use assert_matches::assert_matches;

    use super::*;

    /// In-memory session store keyed by token digest.
    #[derive(Default)]
    struct MemorySessions {
        inner: Mutex<HashMap<String, Session>>,
    }

    impl SessionStore for MemorySessions {
        async fn insert(&self, session: &Session) -> Result<(), StoreError> {
            self.inner
                .lock()
                .unwrap()
                .insert(session.token_hash.clone(), session.clone());
            Ok(())
        }

        async fn find_by_token_hash(
            &self,
            token_hash: &str,
        ) -> Result<Option<Session>, StoreError> {
            Ok(self.inner.lock().unwrap().get(token_hash).cloned())
        }

        async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, StoreError> {
            Ok(self.inner.lock().unwrap().remove(token_hash).is_some())
        }
    }

    fn service() -> SessionService<MemorySessions> {
        SessionService::new(MemorySessions::default(), DEFAULT_TTL_HOURS)
    }

    // -- token shape ----------------------------------------------------------

    #[test]
    fn token_is_256_bit_hex() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        let token = generate_token();
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_eq!(hash_token(&token).len(), 64);
        assert_ne!(hash_token(&token), token);
    }

    // -- lifecycle ------------------------------------------------------------

    #[tokio::test]
    async fn issue_then_validate() {
        let svc = service();
        let issued = svc.issue(7).await.unwrap();
        assert_eq!(
            issued.session.expires_at - issued.session.issued_at,
            Duration::hours(24)
        );

        let session = svc.validate(&issued.token).await.unwrap();
        assert_eq!(session.user_id, 7);
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let svc = service();
        assert_matches!(svc.validate("deadbeef").await, Err(AuthError::Invalid));
    }

    #[tokio::test]
    async fn expired_token_is_removed_then_invalid() {
        let svc = service();

        // Plant a session whose expiry has already passed.
        let token = generate_token();
        let now = Utc::now();
        svc.store
            .insert(&Session {
                token_hash: hash_token(&token),
                user_id: 3,
                issued_at: now - Duration::hours(25),
                expires_at: now - Duration::minutes(1),
            })
            .await
            .unwrap();

        // First attempt: expired, and the record is deleted.
        assert_matches!(svc.validate(&token).await, Err(AuthError::Expired));

        // Second attempt: the record is gone, so it is just invalid.
        assert_matches!(svc.validate(&token).await, Err(AuthError::Invalid));
    }

    #[tokio::test]
    async fn token_just_inside_ttl_still_valid() {
        let svc = service();
        let token = generate_token();
        let now = Utc::now();
        svc.store
            .insert(&Session {
                token_hash: hash_token(&token),
                user_id: 3,
                issued_at: now - Duration::hours(24) + Duration::minutes(1),
                expires_at: now + Duration::minutes(1),
            })
            .await
            .unwrap();

        assert!(svc.validate(&token).await.is_ok());
    }

    #[tokio::test]
    async fn revoke_deletes_once() {
        let svc = service();
        let issued = svc.issue(5).await.unwrap();

        assert!(svc.revoke(&issued.token).await.unwrap());
        assert!(!svc.revoke(&issued.token).await.unwrap());
        assert_matches!(svc.validate(&issued.token).await, Err(AuthError::Invalid));
    }

    #[tokio::test]
    async fn sessions_are_additive_per_user() {
        let svc = service();
        let first = svc.issue(9).await.unwrap();
        let second = svc.issue(9).await.unwrap();

        // Issuing a second session must not revoke the first.
        assert!(svc.validate(&first.token).await.is_ok());
        assert!(svc.validate(&second.token).await.is_ok());
    }
}
