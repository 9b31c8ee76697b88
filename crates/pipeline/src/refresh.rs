//! Status refresh: one reconciliation pass against the store.
//!
//! The persisted map is read, reconciled, and written back only when the
//! pass observed at least one transition. The write is a compare-and-swap
//! against the map that was read; if another pass wrote in between, the
//! fresh map is re-read and this pass's observations are merged onto it
//! with the forward-only rule before trying again.

use std::sync::Arc;

use reelforge_core::error::CoreError;
use reelforge_core::job_status::{JobStatusMap, StatusTally};
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;
use reelforge_db::JobStore;
use serde::Serialize;

use crate::error::PipelineError;
use crate::reconciler::{job_details, BatchReconciler, JobDetail};

/// Compare-and-swap attempts before a refresh gives up.
const MAX_SWAP_ATTEMPTS: u32 = 3;

/// Result of a refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub project_id: DbId,
    pub stage: GenerationStage,
    #[serde(flatten)]
    pub tally: StatusTally,
    /// This pass wrote the map. `false` when nothing moved, and also when
    /// a concurrent pass had already persisted everything this one saw.
    pub changed: bool,
    pub all_done: bool,
    /// Map as persisted after this pass.
    pub job_status_map: JobStatusMap,
    pub jobs: Vec<JobDetail>,
}

/// Stored state of a stage, read without contacting the provider.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub project_id: DbId,
    pub stage: GenerationStage,
    #[serde(flatten)]
    pub tally: StatusTally,
    pub all_done: bool,
    pub job_status_map: JobStatusMap,
}

/// Runs refresh passes for project stages.
#[derive(Clone)]
pub struct RefreshService {
    store: Arc<dyn JobStore>,
    reconciler: BatchReconciler,
}

impl RefreshService {
    pub fn new(store: Arc<dyn JobStore>, reconciler: BatchReconciler) -> Self {
        Self { store, reconciler }
    }

    /// Probe every pending job of the stage once and persist any progress.
    ///
    /// Safe to call repeatedly: with no provider-side change the pass
    /// reports `changed = false` and issues no write.
    pub async fn refresh(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<RefreshReport, PipelineError> {
        let before = self.load_map(project_id, stage).await?;
        let outcome = self.reconciler.reconcile(&before).await;

        let (persisted, wrote) = if outcome.changed {
            self.persist(project_id, stage, &before, &outcome.updated)
                .await?
        } else {
            (outcome.updated, false)
        };

        let tally = persisted.tally();
        tracing::info!(
            project_id,
            %stage,
            total = tally.total,
            completed = tally.completed,
            pending = tally.pending,
            failed = tally.failed,
            observed_change = outcome.changed,
            wrote,
            "Job status refreshed",
        );

        Ok(RefreshReport {
            project_id,
            stage,
            tally,
            changed: wrote,
            all_done: tally.all_done(),
            jobs: job_details(&before, &persisted, &outcome.probe_errors),
            job_status_map: persisted,
        })
    }

    /// Read the stored map without probing.
    pub async fn status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<StatusReport, PipelineError> {
        let map = self.load_map(project_id, stage).await?;
        let tally = map.tally();
        Ok(StatusReport {
            project_id,
            stage,
            tally,
            all_done: tally.all_done(),
            job_status_map: map,
        })
    }

    async fn load_map(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<JobStatusMap, PipelineError> {
        self.store
            .load_job_status(project_id, stage)
            .await?
            .ok_or_else(|| {
                PipelineError::Core(CoreError::NotFound {
                    entity: "GenerationJobStatus",
                    id: project_id,
                })
            })
    }

    /// Write `updated` if the store still holds `before`; otherwise merge
    /// onto the fresh map and retry. Returns the map that is persisted
    /// when this call returns and whether this call wrote it.
    async fn persist(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        before: &JobStatusMap,
        updated: &JobStatusMap,
    ) -> Result<(JobStatusMap, bool), PipelineError> {
        let mut expected = before.clone();
        let mut next = updated.clone();

        for attempt in 1..=MAX_SWAP_ATTEMPTS {
            if self
                .store
                .compare_and_replace_job_status(project_id, stage, &expected, &next)
                .await?
            {
                return Ok((next, true));
            }

            tracing::warn!(
                project_id,
                %stage,
                attempt,
                "Job status map changed during refresh, merging onto fresh copy",
            );

            let fresh = self.load_map(project_id, stage).await?;
            let mut merged = fresh.clone();
            if !merged.merge_forward(updated) {
                // Everything this pass saw is already persisted.
                return Ok((fresh, false));
            }
            expected = fresh;
            next = merged;
        }

        Err(PipelineError::Core(CoreError::Conflict(format!(
            "Job status for project {project_id} stage {stage} kept changing; \
             gave up after {MAX_SWAP_ATTEMPTS} attempts"
        ))))
    }
}
