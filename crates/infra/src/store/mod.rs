//! Credential storage boundary.
//!
//! Users, roles and personal access tokens live behind one trait so the
//! services never know whether they run against Postgres or process memory.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;
pub use r#trait::{CredentialStore, SharedStore, StoreError, StoredUser, UserDraft, UserPatch};
