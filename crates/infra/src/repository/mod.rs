//! User persistence boundary.
//!
//! Defines the `UserRepository` port and its two adapters: an in-memory
//! store for tests/dev and a Postgres store for persistent deployments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryUserRepository;
pub use postgres::PostgresUserRepository;
pub use r#trait::{RepositoryError, UserRepository};
