//! Route definitions for a project's generation stages.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::generation;
use crate::router::with_request_timeout;
use crate::state::AppState;

/// Routes mounted at `/projects/{id}/generation`.
///
/// ```text
/// GET    /{stage}            -> get_status
/// POST   /{stage}/submit     -> submit_stage
/// POST   /{stage}/refresh    -> refresh_stage
/// ```
///
/// Status and refresh run under `request_timeout`. Submit is bounded per
/// unit by the provider client, not by the request timeout.
pub fn router(request_timeout: Duration) -> Router<AppState> {
    let bounded = Router::new()
        .route("/{stage}", get(generation::get_status))
        .route("/{stage}/refresh", post(generation::refresh_stage));

    with_request_timeout(bounded, request_timeout)
        .route("/{stage}/submit", post(generation::submit_stage))
}
