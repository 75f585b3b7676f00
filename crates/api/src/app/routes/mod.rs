use axum::{routing::get, Router};

pub mod system;
pub mod users;

/// Router for every endpoint the service exposes.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(users::router())
}
