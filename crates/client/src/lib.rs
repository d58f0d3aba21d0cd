//! HTTP client for the Warden API with an explicit session object.
//!
//! The [`Session`] is the single source of truth for "who am I" on the client
//! side. [`WardenClient`] reads the token through it for every protected call
//! and invalidates it on logout or on any 401.

pub mod client;
pub mod error;
pub mod session;

pub use client::WardenClient;
pub use error::ClientError;
pub use session::{Session, SessionState};
