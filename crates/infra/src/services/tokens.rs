//! Personal access token lifecycle.

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};

use warden_auth::{AccessToken, PlainTextToken, User};
use warden_core::{DomainError, DomainResult};

use crate::store::SharedStore;

/// Issues, resolves and revokes bearer tokens.
///
/// Only the SHA-256 digest of a token reaches the store; the plaintext is
/// handed to the caller exactly once, at issue time.
#[derive(Clone)]
pub struct TokenService {
    store: SharedStore,
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(store: SharedStore, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    /// Mint a new token for `user`. Earlier tokens stay valid.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn issue(&self, user: &User) -> DomainResult<PlainTextToken> {
        let token = PlainTextToken::generate();
        let record = AccessToken::new(user.id, token.hash(), Utc::now());
        let token_id = record.id;
        self.store.insert_token(record).await?;
        debug!(%token_id, "access token issued");
        Ok(token)
    }

    /// Resolve a presented token to its user.
    ///
    /// Unknown, expired and orphaned tokens all resolve to `None`; expired
    /// ones are removed on the way.
    #[instrument(skip_all)]
    pub async fn validate(&self, presented: &str) -> DomainResult<Option<User>> {
        if presented.is_empty() {
            return Ok(None);
        }

        let hash = PlainTextToken::from_presented(presented).hash();
        let Some(record) = self.store.find_token(&hash).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if record.is_expired(self.ttl, now) {
            self.store.delete_token(&hash).await?;
            info!(token_id = %record.id, user_id = %record.user_id, "expired access token removed");
            return Ok(None);
        }

        let Some(user) = self.store.get_user(record.user_id).await? else {
            return Ok(None);
        };

        self.store.touch_token(record.id, now).await?;
        Ok(Some(user))
    }

    /// Like [`validate`](Self::validate) but fails with `Unauthenticated`.
    pub async fn authenticate(&self, presented: &str) -> DomainResult<User> {
        self.validate(presented)
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    /// Delete exactly the presented token.
    #[instrument(skip_all)]
    pub async fn revoke(&self, presented: &str) -> DomainResult<()> {
        let hash = PlainTextToken::from_presented(presented).hash();
        if !self.store.delete_token(&hash).await? {
            return Err(DomainError::not_found("Token not found"));
        }
        info!("access token revoked");
        Ok(())
    }
}
