//! Login credentials.

use serde::{Deserialize, Serialize};

use warden_core::FieldErrors;
use warden_core::validation::rules;

use crate::user::normalize_email;

/// Body of a login request.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Well-formed credentials, not yet checked against the store.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for LoginAttempt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoginAttempt")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    /// Shape checks only; the password policy is not applied at login.
    pub fn validate(&self) -> Result<LoginAttempt, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = errors.require("email", self.email.as_deref()).map(str::trim);
        if let Some(email) = email {
            errors.check("email", rules::email("email", email));
        }
        let password = errors.require("password", self.password.as_deref());

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => Ok(LoginAttempt {
                email: normalize_email(email),
                password: password.to_string(),
            }),
            _ => Err(errors),
        }
    }
}
