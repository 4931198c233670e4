//! Sign-in domain logic: the OAuth flow, the Google gateway and user resolution.
//!
//! Consumers of this crate (`web`) reach entities through the re-exports below rather than
//! depending on `entity_api` directly.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{users, Id};

pub mod error;
pub mod gateway;
pub mod oauth;
pub mod sign_in;
pub mod user;
