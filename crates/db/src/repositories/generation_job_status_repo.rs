//! Repository for the `generation_job_status` table.
//!
//! One row per (project, stage). The `job_status` JSONB column is always
//! replaced whole.

use reelforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::generation_job_status::GenerationJobStatusRow;

/// Column list for `generation_job_status` queries.
const COLUMNS: &str = "project_id, stage, job_status, updated_at";

/// Provides read/replace operations for persisted job status maps.
pub struct GenerationJobStatusRepo;

impl GenerationJobStatusRepo {
    /// Find the status row for a project stage.
    pub async fn find(
        pool: &PgPool,
        project_id: DbId,
        stage: &str,
    ) -> Result<Option<GenerationJobStatusRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_job_status \
             WHERE project_id = $1 AND stage = $2"
        );
        sqlx::query_as::<_, GenerationJobStatusRow>(&query)
            .bind(project_id)
            .bind(stage)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite the status map for a project stage.
    pub async fn upsert(
        pool: &PgPool,
        project_id: DbId,
        stage: &str,
        job_status: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO generation_job_status (project_id, stage, job_status) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (project_id, stage) \
             DO UPDATE SET job_status = EXCLUDED.job_status, updated_at = NOW()",
        )
        .bind(project_id)
        .bind(stage)
        .bind(job_status)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Overwrite the status map only if it still equals `expected`.
    ///
    /// JSONB equality ignores key order. Returns `true` if a row was
    /// updated.
    pub async fn compare_and_replace(
        pool: &PgPool,
        project_id: DbId,
        stage: &str,
        expected: &serde_json::Value,
        job_status: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generation_job_status \
             SET job_status = $3, updated_at = NOW() \
             WHERE project_id = $1 AND stage = $2 AND job_status = $4",
        )
        .bind(project_id)
        .bind(stage)
        .bind(job_status)
        .bind(expected)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
