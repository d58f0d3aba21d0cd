//! Login and logout.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use warden_auth::{Credentials, PasswordHash, PlainTextToken, User};
use warden_core::{DomainError, DomainResult};

use super::hashing::{hash_password, verify_password};
use super::tokens::TokenService;
use crate::store::SharedStore;

/// A successful login: the user and the one-time plaintext token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: PlainTextToken,
}

#[derive(Clone)]
pub struct SessionService {
    store: SharedStore,
    tokens: TokenService,
    bcrypt_cost: u32,
    // Verified against when the email is unknown.
    decoy: Arc<OnceCell<PasswordHash>>,
}

impl SessionService {
    pub fn new(store: SharedStore, tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
            decoy: Arc::new(OnceCell::new()),
        }
    }

    /// Check credentials and issue a fresh token.
    ///
    /// An unknown email and a wrong password both fail with
    /// `InvalidCredentials`.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> DomainResult<LoginOutcome> {
        let attempt = credentials.validate().map_err(DomainError::validation)?;

        let Some(stored) = self.store.find_user_by_email(&attempt.email).await? else {
            let decoy = self.decoy_hash().await?;
            verify_password(decoy, attempt.password).await?;
            warn!("login rejected: unknown email");
            return Err(DomainError::InvalidCredentials);
        };

        if !verify_password(stored.password_hash, attempt.password).await? {
            warn!(user_id = %stored.user.id, "login rejected: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.tokens.issue(&stored.user).await?;
        info!(user_id = %stored.user.id, "login succeeded");
        Ok(LoginOutcome {
            user: stored.user,
            token,
        })
    }

    /// Revoke the token the caller authenticated with. Other sessions of the
    /// same user stay valid.
    ///
    /// A token that is already gone, e.g. revoked by a concurrent logout,
    /// is `Unauthenticated`.
    pub async fn logout(&self, presented: &str) -> DomainResult<()> {
        match self.tokens.revoke(presented).await {
            Err(DomainError::NotFound(_)) => Err(DomainError::Unauthenticated),
            other => other,
        }
    }

    async fn decoy_hash(&self) -> DomainResult<PasswordHash> {
        let cost = self.bcrypt_cost;
        self.decoy
            .get_or_try_init(|| hash_password("decoy-password".to_string(), cost))
            .await
            .cloned()
    }
}
