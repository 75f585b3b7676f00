//! `userdir-core` — the user record and its identifier.
//!
//! This crate contains **pure domain** types (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod user;

pub use error::DomainError;
pub use id::UserId;
pub use user::User;
