//! PostgreSQL-backed [`JobStore`].

use async_trait::async_trait;
use reelforge_core::inputs::ProjectInputs;
use reelforge_core::job_status::JobStatusMap;
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::generation_job_status::encode_job_status;
use crate::repositories::{GenerationJobStatusRepo, ProjectRepo};
use crate::store::JobStore;

/// [`JobStore`] over a Postgres pool. Cheap to clone.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn load_project(&self, project_id: DbId) -> Result<Option<ProjectInputs>, StoreError> {
        if ProjectRepo::find_by_id(&self.pool, project_id).await?.is_none() {
            return Ok(None);
        }

        let scenes = ProjectRepo::list_scenes(&self.pool, project_id).await?;
        let frame_pairs = ProjectRepo::list_frame_pairs(&self.pool, project_id).await?;

        Ok(Some(ProjectInputs {
            project_id,
            scenes: scenes.into_iter().map(Into::into).collect(),
            frame_pairs: frame_pairs.into_iter().map(Into::into).collect(),
        }))
    }

    async fn load_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<Option<JobStatusMap>, StoreError> {
        GenerationJobStatusRepo::find(&self.pool, project_id, stage.as_str())
            .await?
            .map(|row| row.decode(stage))
            .transpose()
    }

    async fn replace_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        map: &JobStatusMap,
    ) -> Result<(), StoreError> {
        GenerationJobStatusRepo::upsert(
            &self.pool,
            project_id,
            stage.as_str(),
            &encode_job_status(map),
        )
        .await?;
        tracing::debug!(project_id, %stage, jobs = map.len(), "Job status map replaced");
        Ok(())
    }

    async fn compare_and_replace_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        expected: &JobStatusMap,
        map: &JobStatusMap,
    ) -> Result<bool, StoreError> {
        let swapped = GenerationJobStatusRepo::compare_and_replace(
            &self.pool,
            project_id,
            stage.as_str(),
            &encode_job_status(expected),
            &encode_job_status(map),
        )
        .await?;
        if !swapped {
            tracing::debug!(project_id, %stage, "Job status map changed underneath, swap refused");
        }
        Ok(swapped)
    }
}
