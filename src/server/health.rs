//! Liveness probe.

use axum::http::StatusCode;

/// `GET /health`: 200 with `OK` while the process serves requests.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
