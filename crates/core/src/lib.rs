//! `warden-core`: shared building blocks for the user/role admin service.
//!
//! Pure types only: identifiers, the error taxonomy and typed field
//! validation. No IO, no HTTP, no storage.

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{RoleId, TokenId, UserId};
pub use validation::FieldErrors;
