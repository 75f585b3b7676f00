use axum::http::StatusCode;

/// Liveness check; does not touch the store.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
