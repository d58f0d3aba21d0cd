//! `warden-auth`: credentials, tokens and the user/role records.
//!
//! This crate is intentionally decoupled from HTTP and storage: it owns the
//! password policy, hashing, token minting and the per-record validators.

pub mod credentials;
pub mod password;
pub mod role;
pub mod token;
pub mod user;

pub use credentials::{Credentials, LoginAttempt};
pub use password::{HashError, PasswordHash, PasswordRule, SPECIAL_CHARS};
pub use role::{CreateRole, NewRole, Role, RoleChanges, RoleSummary, UpdateRole};
pub use token::{AccessToken, PlainTextToken, TokenHash};
pub use user::{CreateUser, NewUser, UpdateUser, User, UserChanges, UserWithRole, normalize_email};
