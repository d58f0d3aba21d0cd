use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use warden_auth::{AccessToken, NewRole, PasswordHash, Role, RoleChanges, TokenHash, User, UserWithRole};
use warden_core::{RoleId, TokenId, UserId};

/// A user row including its password hash. Never leaves the infra layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: PasswordHash,
}

/// A user ready to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub full_name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub role_id: RoleId,
}

/// Column-level patch for a user. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<PasswordHash>,
    pub role_id: Option<RoleId>,
}

/// Credential store operation error.
///
/// Constraint failures carry the offending field so the services can report
/// them on the same key the request used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate value for unique field '{field}'")]
    Duplicate { field: &'static str },

    #[error("field '{field}' references a record that does not exist")]
    MissingReference { field: &'static str },

    #[error("record is still referenced: {0}")]
    InUse(String),

    #[error("record not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence boundary for users, roles and access tokens.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - enforce uniqueness of `users.full_name`, `users.email` and `roles.name`
///   atomically with the write (two racing inserts: exactly one succeeds)
/// - reject user writes whose `role_id` does not exist (`MissingReference`)
/// - reject deleting a role that users still reference (`InUse`)
/// - delete a user's tokens together with the user
/// - assign ids monotonically
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>, StoreError>;

    async fn get_role(&self, id: RoleId) -> Result<Option<Role>, StoreError>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, StoreError>;

    async fn insert_role(&self, role: NewRole, now: DateTime<Utc>) -> Result<Role, StoreError>;

    async fn update_role(
        &self,
        id: RoleId,
        changes: RoleChanges,
        now: DateTime<Utc>,
    ) -> Result<Role, StoreError>;

    async fn delete_role(&self, id: RoleId) -> Result<(), StoreError>;

    /// All users with their role embedded, ordered by id.
    async fn list_users(&self) -> Result<Vec<UserWithRole>, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StoreError>;

    async fn find_user_by_full_name(&self, full_name: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&self, user: UserDraft, now: DateTime<Utc>) -> Result<User, StoreError>;

    async fn update_user(
        &self,
        id: UserId,
        patch: UserPatch,
        now: DateTime<Utc>,
    ) -> Result<User, StoreError>;

    /// Delete a user and every token bound to it.
    async fn delete_user(&self, id: UserId) -> Result<(), StoreError>;

    async fn insert_token(&self, token: AccessToken) -> Result<(), StoreError>;

    async fn find_token(&self, hash: &TokenHash) -> Result<Option<AccessToken>, StoreError>;

    async fn touch_token(&self, id: TokenId, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Remove exactly the token with this hash; `false` when none matched.
    async fn delete_token(&self, hash: &TokenHash) -> Result<bool, StoreError>;
}

/// Type-erased store shared across services and request handlers.
pub type SharedStore = Arc<dyn CredentialStore>;
