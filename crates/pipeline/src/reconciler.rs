//! Batch Reconciler: one probe per pending job, merged into a new map.
//!
//! Jobs already terminal in the input map are never probed. All pending
//! jobs are probed concurrently; because every job owns a distinct key the
//! merged result does not depend on the order probes resolve in.

use std::collections::HashMap;

use futures::future::join_all;
use reelforge_core::job_status::{JobStatusKind, JobStatusMap};
use reelforge_core::types::JobHandle;
use reelforge_provider::StatusProber;
use serde::Serialize;

/// Result of one reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// Input map with every observed transition applied.
    pub updated: JobStatusMap,
    /// At least one job moved out of `Pending`.
    pub changed: bool,
    /// Handles whose probe failed this pass, with the error message.
    pub probe_errors: HashMap<JobHandle, String>,
}

/// Per-job view returned to callers of a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDetail {
    pub handle: JobHandle,
    pub status: JobStatusKind,
    pub artifact_url: Option<String>,
    pub failure_reason: Option<String>,
    /// The job was already terminal before this pass and was not probed.
    pub already_processed: bool,
    /// Why the probe for this job produced no answer, if it did not.
    pub probe_error: Option<String>,
}

/// Probes pending jobs through a [`StatusProber`].
#[derive(Clone)]
pub struct BatchReconciler {
    prober: StatusProber,
}

impl BatchReconciler {
    pub fn new(prober: StatusProber) -> Self {
        Self { prober }
    }

    /// Run one reconciliation pass over `map`.
    ///
    /// Probe errors leave the job pending; they are reported in
    /// [`ReconcileOutcome::probe_errors`] and retried on the next pass.
    pub async fn reconcile(&self, map: &JobStatusMap) -> ReconcileOutcome {
        let candidates = map.pending_handles();

        let probes = join_all(candidates.iter().map(|handle| async move {
            (handle, self.prober.probe(handle).await)
        }))
        .await;

        let mut updated = map.clone();
        let mut changed = false;
        let mut probe_errors = HashMap::new();

        for (handle, result) in probes {
            match result {
                Ok(observed) => {
                    let status = observed.to_job_status();
                    if updated.observe(handle, &status) {
                        changed = true;
                        tracing::info!(
                            handle = %handle,
                            status = ?status.kind(),
                            artifact_url = status.artifact_url(),
                            reason = status.failure_reason(),
                            "Generation job reached a terminal state",
                        );
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        handle = %handle,
                        error = %e,
                        "Status probe failed, job stays pending",
                    );
                    probe_errors.insert(handle.clone(), e.to_string());
                }
            }
        }

        tracing::debug!(
            probed = candidates.len(),
            skipped = map.len() - candidates.len(),
            changed,
            "Reconciliation pass finished",
        );

        ReconcileOutcome {
            updated,
            changed,
            probe_errors,
        }
    }
}

/// Build per-job details for `current`, marking entries that were already
/// terminal in `before`.
pub fn job_details(
    before: &JobStatusMap,
    current: &JobStatusMap,
    probe_errors: &HashMap<JobHandle, String>,
) -> Vec<JobDetail> {
    current
        .iter()
        .map(|(handle, status)| JobDetail {
            handle: handle.clone(),
            status: status.kind(),
            artifact_url: status.artifact_url().map(str::to_string),
            failure_reason: status.failure_reason().map(str::to_string),
            already_processed: before.get(handle).is_some_and(|s| s.is_terminal()),
            probe_error: probe_errors.get(handle).cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reelforge_core::job_status::JobStatus;
    use reelforge_provider::mock::ScriptedProvider;

    use super::*;

    fn reconciler(provider: &ScriptedProvider) -> BatchReconciler {
        BatchReconciler::new(StatusProber::new(Arc::new(provider.clone())))
    }

    fn map(entries: &[(&str, JobStatus)]) -> JobStatusMap {
        entries
            .iter()
            .map(|(h, s)| (h.to_string(), s.clone()))
            .collect()
    }

    #[tokio::test]
    async fn terminal_jobs_are_not_probed() {
        let provider = ScriptedProvider::new();
        provider.set_pending("h3");

        let input = map(&[
            ("h1", JobStatus::completed("https://cdn/x.mp4")),
            ("h2", JobStatus::Failed { reason: None }),
            ("h3", JobStatus::Pending),
        ]);
        let outcome = reconciler(&provider).reconcile(&input).await;

        assert_eq!(provider.probed_handles(), vec!["h3".to_string()]);
        assert!(!outcome.changed);
        assert_eq!(outcome.updated, input);
    }

    #[tokio::test]
    async fn completions_and_failures_are_merged() {
        let provider = ScriptedProvider::new();
        provider
            .set_completed("h1", "https://cdn/y.mp4")
            .set_failed("h2", "moderation")
            .set_pending("h3");

        let input = map(&[
            ("h1", JobStatus::Pending),
            ("h2", JobStatus::Pending),
            ("h3", JobStatus::Pending),
        ]);
        let outcome = reconciler(&provider).reconcile(&input).await;

        assert!(outcome.changed);
        assert_eq!(
            outcome.updated.get("h1"),
            Some(&JobStatus::completed("https://cdn/y.mp4"))
        );
        assert_eq!(outcome.updated.get("h2"), Some(&JobStatus::failed("moderation")));
        assert_eq!(outcome.updated.get("h3"), Some(&JobStatus::Pending));
        assert!(outcome.probe_errors.is_empty());
    }

    #[tokio::test]
    async fn probe_error_leaves_job_pending() {
        let provider = ScriptedProvider::new();
        provider.set_completed("h2", "https://cdn/ok.mp4");

        let input = map(&[("h1", JobStatus::Pending), ("h2", JobStatus::Pending)]);
        let outcome = reconciler(&provider).reconcile(&input).await;

        assert!(outcome.changed);
        assert_eq!(outcome.updated.get("h1"), Some(&JobStatus::Pending));
        assert!(outcome.probe_errors.contains_key("h1"));
        assert!(!outcome.probe_errors.contains_key("h2"));
    }

    #[tokio::test]
    async fn all_pending_is_unchanged() {
        let provider = ScriptedProvider::new();
        provider.set_pending("h1").set_pending("h2");

        let input = map(&[("h1", JobStatus::Pending), ("h2", JobStatus::Pending)]);
        let outcome = reconciler(&provider).reconcile(&input).await;

        assert!(!outcome.changed);
        assert_eq!(outcome.updated, input);
    }

    #[tokio::test]
    async fn empty_map_probes_nothing() {
        let provider = ScriptedProvider::new();
        let outcome = reconciler(&provider).reconcile(&JobStatusMap::new()).await;
        assert!(!outcome.changed);
        assert!(provider.probed_handles().is_empty());
    }

    #[test]
    fn details_flag_previously_terminal_entries() {
        let before = map(&[
            ("h1", JobStatus::completed("https://cdn/x.mp4")),
            ("h2", JobStatus::Pending),
            ("h3", JobStatus::Pending),
        ]);
        let after = map(&[
            ("h1", JobStatus::completed("https://cdn/x.mp4")),
            ("h2", JobStatus::completed("https://cdn/y.mp4")),
            ("h3", JobStatus::Pending),
        ]);
        let errors = HashMap::from([("h3".to_string(), "timeout".to_string())]);

        let details = job_details(&before, &after, &errors);

        assert_eq!(details.len(), 3);
        assert!(details[0].already_processed);
        assert!(!details[1].already_processed);
        assert_eq!(details[1].artifact_url.as_deref(), Some("https://cdn/y.mp4"));
        assert_eq!(details[2].status, JobStatusKind::Pending);
        assert_eq!(details[2].probe_error.as_deref(), Some("timeout"));
    }
}
