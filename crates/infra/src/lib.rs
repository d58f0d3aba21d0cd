//! Infrastructure layer: credential storage and the services built on it.
//!
//! - `store`: the [`CredentialStore`] boundary with in-memory and Postgres backends
//! - `services`: user/role CRUD, token lifecycle, login/logout and first-run seeding

pub mod services;
pub mod store;

pub use services::{LoginOutcome, ServiceConfig, Services, seed_admin};
pub use store::{
    CredentialStore, InMemoryCredentialStore, PostgresCredentialStore, SharedStore, StoreError,
};
