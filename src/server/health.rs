//! Liveness endpoint.

use axum::http::StatusCode;

/// `GET /health`: answers `200 OK` while the process is serving requests.
///
/// Does not contact GitHub; a bad token shows up as 502s on `/webhook`
/// instead.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
