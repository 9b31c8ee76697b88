//! Persisted job status map per project stage.

use reelforge_core::job_status::JobStatusMap;
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::StoreError;

/// A row from the `generation_job_status` table.
///
/// `job_status` holds the compact wire form: handle -> `"pending"` |
/// `"failed"` | artifact URL.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationJobStatusRow {
    pub project_id: DbId,
    pub stage: String,
    pub job_status: serde_json::Value,
    pub updated_at: Timestamp,
}

impl GenerationJobStatusRow {
    /// Decode the JSONB column into a typed map.
    pub fn decode(self, stage: GenerationStage) -> Result<JobStatusMap, StoreError> {
        serde_json::from_value(self.job_status).map_err(|e| StoreError::Corrupt {
            project_id: self.project_id,
            stage,
            reason: e.to_string(),
        })
    }
}

/// Encode a map into its JSONB form.
pub fn encode_job_status(map: &JobStatusMap) -> serde_json::Value {
    // Serializing a map of strings cannot fail.
    serde_json::to_value(map).unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
}
