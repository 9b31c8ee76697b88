//! Stage submission: build work units, submit them, persist the initial map.

use std::sync::Arc;

use reelforge_core::error::CoreError;
use reelforge_core::job_status::{JobStatusKind, JobStatusMap};
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::{DbId, JobHandle};
use reelforge_core::work_unit::{build_work_units, WorkUnit};
use reelforge_db::JobStore;
use reelforge_provider::{GenerationGateway, SubmissionError, UnitSubmission};
use serde::Serialize;

use crate::error::PipelineError;

/// Per-unit line of a [`SubmitReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitResult {
    pub unit_ref: String,
    /// `None` when the provider never assigned a handle.
    pub handle: Option<JobHandle>,
    /// A handle was obtained and the job entered the status map.
    pub success: bool,
    /// Status recorded for the job. `None` for units without a handle.
    pub status: Option<JobStatusKind>,
    pub artifact_url: Option<String>,
    pub error: Option<String>,
}

/// Summary of a submission pass.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReport {
    pub project_id: DbId,
    pub stage: GenerationStage,
    /// Units submitted, with or without a handle.
    pub total: usize,
    /// Finished inside the provider's bounded wait.
    pub completed: usize,
    pub pending: usize,
    /// Units that got no handle plus jobs that failed immediately.
    pub failed: usize,
    pub job_status_map: JobStatusMap,
    pub results: Vec<UnitResult>,
}

/// Submits every unit of a project stage and records the initial map.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn JobStore>,
    gateway: Arc<GenerationGateway>,
}

impl SubmissionService {
    pub fn new(store: Arc<dyn JobStore>, gateway: Arc<GenerationGateway>) -> Self {
        Self { store, gateway }
    }

    /// Submit the stage and replace its status map.
    ///
    /// Refuses with [`CoreError::Conflict`] while the previous submission
    /// of the stage still has pending jobs, unless `force` is set.
    ///
    /// The batch and the write of its map run on their own task. Dropping
    /// the returned future (a client disconnect, a request timeout) does
    /// not stop it, so every handle the provider hands out is recorded.
    pub async fn submit(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        force: bool,
    ) -> Result<SubmitReport, PipelineError> {
        let inputs = self
            .store
            .load_project(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })?;
        let units = build_work_units(&inputs, stage)?;

        if !force {
            if let Some(existing) = self.store.load_job_status(project_id, stage).await? {
                let pending = existing.tally().pending;
                if pending > 0 {
                    return Err(CoreError::Conflict(format!(
                        "Project {project_id} stage {stage} still has {pending} pending jobs; \
                         refresh them or resubmit with force"
                    ))
                    .into());
                }
            }
        }

        let service = self.clone();
        let batch =
            tokio::spawn(async move { service.submit_and_record(project_id, stage, units).await });

        batch.await.map_err(|e| {
            PipelineError::Core(CoreError::Internal(format!(
                "Submission task for project {project_id} stage {stage} did not finish: {e}"
            )))
        })?
    }

    async fn submit_and_record(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        units: Vec<WorkUnit>,
    ) -> Result<SubmitReport, PipelineError> {
        let submissions = self.gateway.submit_batch(&units).await?;
        let (map, results) = initial_map(submissions);

        self.store
            .replace_job_status(project_id, stage, &map)
            .await?;

        let tally = map.tally();
        let unsubmitted = results.iter().filter(|r| !r.success).count();
        let report = SubmitReport {
            project_id,
            stage,
            total: results.len(),
            completed: tally.completed,
            pending: tally.pending,
            failed: tally.failed + unsubmitted,
            job_status_map: map,
            results,
        };

        tracing::info!(
            project_id,
            %stage,
            total = report.total,
            completed = report.completed,
            pending = report.pending,
            failed = report.failed,
            "Generation stage submitted",
        );

        Ok(report)
    }
}

/// Fold gateway outcomes into the initial map and the per-unit results.
///
/// Units without a handle never enter the map. A handle the provider
/// already gave to an earlier unit is kept for the earlier unit only; the
/// later unit is reported as failed.
fn initial_map(submissions: Vec<UnitSubmission>) -> (JobStatusMap, Vec<UnitResult>) {
    let mut map = JobStatusMap::new();
    let mut results = Vec::with_capacity(submissions.len());

    for UnitSubmission { unit_ref, outcome } in submissions {
        match outcome {
            Ok(job) if map.contains_key(&job.handle) => {
                let error = SubmissionError::DuplicateHandle(job.handle.clone());
                tracing::warn!(unit_ref = %unit_ref, handle = %job.handle, "Duplicate job handle");
                results.push(UnitResult {
                    unit_ref,
                    handle: Some(job.handle),
                    success: false,
                    status: None,
                    artifact_url: None,
                    error: Some(error.to_string()),
                });
            }
            Ok(job) => {
                let status = job.immediate.to_job_status();
                results.push(UnitResult {
                    unit_ref,
                    handle: Some(job.handle.clone()),
                    success: true,
                    status: Some(status.kind()),
                    artifact_url: status.artifact_url().map(str::to_string),
                    error: status.failure_reason().map(str::to_string),
                });
                map.insert(job.handle, status);
            }
            Err(e) => results.push(UnitResult {
                unit_ref,
                handle: None,
                success: false,
                status: None,
                artifact_url: None,
                error: Some(e.to_string()),
            }),
        }
    }

    (map, results)
}
