//! Client-side authentication state machine.
//!
//! ```text
//! Anonymous ──begin_login──▶ Authenticating ──complete_login──▶ Authenticated
//!     ▲                           │                                  │
//!     └────────fail_login─────────┘                                  │
//!     └──────────────────logout / 401 (invalidate)───────────────────┘
//! ```
//!
//! Logging in again from `Authenticated` hands the replaced token back to the
//! caller for revocation.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use warden_auth::User;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated { token: String, user: User },
}

/// Shared session. Every transition happens under one write lock.
#[derive(Debug, Default)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        match &*self.read() {
            SessionState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<User> {
        match &*self.read() {
            SessionState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(&*self.read(), SessionState::Authenticated { .. })
    }

    /// Enter `Authenticating`. Only one login may be in flight. Returns the
    /// token of the session being replaced, which the caller must revoke.
    pub fn begin_login(&self) -> Result<Option<String>, ClientError> {
        let mut state = self.write();
        if *state == SessionState::Authenticating {
            return Err(ClientError::LoginInProgress);
        }
        match std::mem::replace(&mut *state, SessionState::Authenticating) {
            SessionState::Authenticated { token, .. } => Ok(Some(token)),
            _ => Ok(None),
        }
    }

    pub fn complete_login(&self, token: String, user: User) {
        *self.write() = SessionState::Authenticated { token, user };
    }

    pub fn fail_login(&self) {
        let mut state = self.write();
        if *state == SessionState::Authenticating {
            *state = SessionState::Anonymous;
        }
    }

    /// Drop back to `Anonymous`, returning the token that was held.
    pub fn invalidate(&self) -> Option<String> {
        match std::mem::take(&mut *self.write()) {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Invalidate only if `token` is still the current one. A 401 that
    /// arrives for a token already replaced by a newer login is ignored.
    pub fn invalidate_token(&self, token: &str) -> bool {
        let mut state = self.write();
        let current = matches!(
            &*state,
            SessionState::Authenticated { token: held, .. } if held == token
        );
        if current {
            *state = SessionState::Anonymous;
        }
        current
    }
}
