//! Handlers for a project's generation stages.
//!
//! Submit creates the stage's job status map, refresh runs one
//! reconciliation pass, and the plain GET reads the stored map without
//! touching the provider. Clients poll the refresh endpoint; it is safe
//! to call repeatedly.

use axum::extract::{Path, State};
use axum::Json;
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;
use reelforge_pipeline::{RefreshReport, StatusReport, SubmitReport};
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::SuccessResponse;
use crate::state::AppState;

/// Optional body of a submit request.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    /// Resubmit even though the previous submission still has pending jobs.
    #[serde(default)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/generation/{stage}/submit
///
/// Submit every work unit of the stage and persist the initial map.
/// Returns 409 while the stage still has pending jobs unless `force` is set.
pub async fn submit_stage(
    State(state): State<AppState>,
    Path((project_id, stage)): Path<(DbId, String)>,
    body: Option<Json<SubmitRequest>>,
) -> AppResult<Json<SuccessResponse<SubmitReport>>> {
    let stage: GenerationStage = stage.parse()?;
    let force = body.map(|Json(req)| req.force).unwrap_or_default();

    let report = state.submission.submit(project_id, stage, force).await?;

    Ok(Json(SuccessResponse::new(report)))
}

// ---------------------------------------------------------------------------
// Refresh
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{id}/generation/{stage}/refresh
///
/// Probe every pending job once and persist the result if anything moved.
pub async fn refresh_stage(
    State(state): State<AppState>,
    Path((project_id, stage)): Path<(DbId, String)>,
) -> AppResult<Json<SuccessResponse<RefreshReport>>> {
    let stage: GenerationStage = stage.parse()?;

    let report = state.refresh.refresh(project_id, stage).await?;

    Ok(Json(SuccessResponse::new(report)))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/generation/{stage}
pub async fn get_status(
    State(state): State<AppState>,
    Path((project_id, stage)): Path<(DbId, String)>,
) -> AppResult<Json<SuccessResponse<StatusReport>>> {
    let stage: GenerationStage = stage.parse()?;

    let report = state.refresh.status(project_id, stage).await?;

    Ok(Json(SuccessResponse::new(report)))
}
