use warden_auth::{PlainTextToken, User};

/// The authenticated caller, attached to the request by the auth gate.
///
/// Carries the presented token so logout can revoke exactly that one.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    user: User,
    token: PlainTextToken,
}

impl CurrentUser {
    pub fn new(user: User, token: PlainTextToken) -> Self {
        Self { user, token }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn token(&self) -> &PlainTextToken {
        &self.token
    }

    pub fn into_user(self) -> User {
        self.user
    }
}
