pub mod generation;
pub mod health;

use std::time::Duration;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /projects/{id}/generation/{stage}            stored status (GET)
/// /projects/{id}/generation/{stage}/submit     submit stage (POST)
/// /projects/{id}/generation/{stage}/refresh    refresh pass (POST)
/// ```
pub fn api_routes(request_timeout: Duration) -> Router<AppState> {
    Router::new().nest(
        "/projects/{id}/generation",
        generation::router(request_timeout),
    )
}
