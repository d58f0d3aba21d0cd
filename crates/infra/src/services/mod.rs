//! Application services: user/role CRUD, token lifecycle and login/logout.
//!
//! Services own validation against the store (uniqueness, references) and
//! translate `StoreError` into the `DomainError` taxonomy the API renders.

pub mod hashing;
pub mod roles;
pub mod seed;
pub mod sessions;
pub mod tokens;
pub mod users;

use chrono::Duration;

use warden_core::validation::rules;
use warden_core::DomainError;

use crate::store::{SharedStore, StoreError};

pub use roles::RoleService;
pub use seed::seed_admin;
pub use sessions::{LoginOutcome, SessionService};
pub use tokens::TokenService;
pub use users::UserService;

pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Tunables shared by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bcrypt_cost: u32,
    /// `None` means tokens live until logout.
    pub token_ttl: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            token_ttl: None,
        }
    }
}

/// All services wired to one store. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub roles: RoleService,
    pub tokens: TokenService,
    pub sessions: SessionService,
}

impl Services {
    pub fn new(store: SharedStore, config: ServiceConfig) -> Self {
        let tokens = TokenService::new(store.clone(), config.token_ttl);
        Self {
            users: UserService::new(store.clone(), config.bcrypt_cost),
            roles: RoleService::new(store.clone()),
            sessions: SessionService::new(store, tokens.clone(), config.bcrypt_cost),
            tokens,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field } => DomainError::field(field, rules::unique_taken(field)),
            StoreError::MissingReference { field } => {
                DomainError::field(field, rules::invalid_selection(field))
            }
            StoreError::InUse(msg) => DomainError::conflict(msg),
            StoreError::NotFound => DomainError::not_found("Record not found"),
            StoreError::Backend(msg) => DomainError::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_maps_onto_the_field() {
        let err: DomainError = StoreError::Duplicate { field: "email" }.into();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("email"),
            Some(&["The email has already been taken.".to_string()][..])
        );
    }

    #[test]
    fn missing_role_reference_is_invalid_selection() {
        let err: DomainError = StoreError::MissingReference { field: "role_id" }.into();
        let DomainError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("role_id"),
            Some(&["The selected role id is invalid.".to_string()][..])
        );
    }

    #[test]
    fn in_use_and_backend_keep_their_class() {
        assert!(matches!(
            DomainError::from(StoreError::InUse("x".into())),
            DomainError::Conflict(_)
        ));
        assert!(matches!(
            DomainError::from(StoreError::Backend("x".into())),
            DomainError::Internal(_)
        ));
    }

    #[test]
    fn default_config_has_no_token_expiry() {
        let config = ServiceConfig::default();
        assert_eq!(config.bcrypt_cost, 10);
        assert!(config.token_ttl.is_none());
    }
}
