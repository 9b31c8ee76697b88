//! The record store seam.

use async_trait::async_trait;
use reelforge_core::inputs::ProjectInputs;
use reelforge_core::job_status::JobStatusMap;
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;

use crate::error::StoreError;

/// Durable mapping from (project, stage) to a [`JobStatusMap`], plus read
/// access to the project's generation inputs.
///
/// Maps are always read and replaced whole; there are no per-job field
/// updates.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Scenes and frame pairs of a project, or `None` if it does not exist.
    async fn load_project(&self, project_id: DbId) -> Result<Option<ProjectInputs>, StoreError>;

    /// The persisted status map of a stage, or `None` if nothing was ever
    /// submitted for it.
    async fn load_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<Option<JobStatusMap>, StoreError>;

    /// Replace (or create) the status map unconditionally.
    async fn replace_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        map: &JobStatusMap,
    ) -> Result<(), StoreError>;

    /// Replace the status map only if the stored map still equals
    /// `expected` in its persisted form.
    ///
    /// Returns `false` without writing when another writer got there first.
    async fn compare_and_replace_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        expected: &JobStatusMap,
        map: &JobStatusMap,
    ) -> Result<bool, StoreError>;
}
