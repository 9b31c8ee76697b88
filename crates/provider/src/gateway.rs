//! Generation Gateway: batch submission of work units.
//!
//! One provider session is opened per batch and closed after every unit
//! has either been accepted or has failed. Units are submitted with
//! bounded concurrency; a failure on one unit never aborts its siblings.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use reelforge_core::types::JobHandle;
use reelforge_core::work_unit::WorkUnit;

use crate::error::{ProviderError, SubmissionError};
use crate::messages::{normalize, parse_prediction, NormalizedStatus};
use crate::provider::{GenerationProvider, ProviderSession};
use crate::retry::{retry_with_backoff, RetryConfig};

/// Default number of submissions in flight per batch.
const DEFAULT_MAX_CONCURRENT: usize = 4;

/// A unit the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub handle: JobHandle,
    /// Status carried by the submission response itself. `Completed` here
    /// is a fast-path completion: no polling is needed for this job.
    pub immediate: NormalizedStatus,
}

/// Outcome of submitting one unit.
#[derive(Debug)]
pub struct UnitSubmission {
    pub unit_ref: String,
    pub outcome: Result<SubmittedJob, SubmissionError>,
}

/// Submits work units to a [`GenerationProvider`].
pub struct GenerationGateway {
    provider: Arc<dyn GenerationProvider>,
    retry: RetryConfig,
    max_concurrent: usize,
}

impl GenerationGateway {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Submit a single unit over its own session.
    pub async fn submit(&self, unit: &WorkUnit) -> Result<SubmittedJob, SubmissionError> {
        let mut results = self.submit_batch(std::slice::from_ref(unit)).await?;
        match results.pop() {
            Some(result) => result.outcome,
            None => Err(SubmissionError::MissingHandle),
        }
    }

    /// Submit every unit over one session.
    ///
    /// Returns one [`UnitSubmission`] per unit, in input order. Fails only
    /// if the session cannot be opened, in which case nothing was
    /// submitted.
    pub async fn submit_batch(
        &self,
        units: &[WorkUnit],
    ) -> Result<Vec<UnitSubmission>, ProviderError> {
        let batch_id = uuid::Uuid::new_v4();
        let mut session = self.provider.open_session().await?;
        tracing::info!(%batch_id, units = units.len(), "Submitting generation batch");

        let results: Vec<UnitSubmission> = {
            let session: &dyn ProviderSession = session.as_ref();
            // Built up front so the stream holds plain futures rather than
            // a closure over borrowed units; the batch future stays `Send`.
            let pending: Vec<_> = units
                .iter()
                .map(|unit| self.submit_one(session, unit))
                .collect();
            stream::iter(pending)
                .buffered(self.max_concurrent)
                .collect()
                .await
        };

        session.close().await;

        let accepted = results.iter().filter(|r| r.outcome.is_ok()).count();
        tracing::info!(
            %batch_id,
            accepted,
            rejected = results.len() - accepted,
            "Generation batch submitted",
        );

        Ok(results)
    }

    async fn submit_one(&self, session: &dyn ProviderSession, unit: &WorkUnit) -> UnitSubmission {
        let outcome = match retry_with_backoff(&self.retry, || session.submit(unit)).await {
            Ok(body) => interpret_submission(body),
            Err(e) => Err(SubmissionError::Provider(e)),
        };

        match &outcome {
            Ok(job) => tracing::debug!(
                unit_ref = %unit.unit_ref,
                handle = %job.handle,
                immediate = ?job.immediate,
                "Unit accepted",
            ),
            Err(e) => tracing::warn!(
                unit_ref = %unit.unit_ref,
                error = %e,
                "Unit submission failed",
            ),
        }

        UnitSubmission {
            unit_ref: unit.unit_ref.clone(),
            outcome,
        }
    }
}

/// Turn a submission response into a handle plus its immediate status.
///
/// A response whose status cannot be interpreted still yields a pending
/// job as long as it carries a handle; probing resolves it later.
fn interpret_submission(body: serde_json::Value) -> Result<SubmittedJob, SubmissionError> {
    let prediction = parse_prediction(body).map_err(|_| SubmissionError::MissingHandle)?;
    let handle = prediction
        .id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or(SubmissionError::MissingHandle)?;

    let immediate = normalize(&prediction).unwrap_or_else(|e| {
        tracing::debug!(handle = %handle, error = %e, "Submission status not usable, treating as pending");
        NormalizedStatus::Pending
    });

    Ok(SubmittedJob { handle, immediate })
}
