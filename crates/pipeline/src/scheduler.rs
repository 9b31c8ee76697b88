//! Poll Scheduler: repeated refresh passes until a stage settles.
//!
//! Each scheduled poll runs as its own Tokio task. The loop refreshes the
//! stage, reports progress, and sleeps for the configured interval until
//! every job is terminal, the wall-clock budget is spent, or the caller
//! cancels through the [`PollHandle`]. Cancellation is observed between
//! passes only; a pass already in flight is allowed to finish.
//!
//! Running out of budget is a give-up at the scheduler level. Jobs still
//! pending at that point stay pending in the store.

use std::sync::Arc;
use std::time::Duration;

use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;
use serde::Serialize;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::refresh::{RefreshReport, RefreshService};

/// Default delay between passes.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Default wall-clock budget for one scheduled poll.
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(30 * 60);

/// Timing of a scheduled poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl PollConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// | Env var            | Default   |
    /// |--------------------|-----------|
    /// | `POLL_INTERVAL_MS` | `10000`   |
    /// | `POLL_MAX_WAIT_MS` | `1800000` |
    pub fn from_env() -> Self {
        let interval = std::env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);

        let max_wait = std::env::var("POLL_MAX_WAIT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MAX_WAIT);

        Self { interval, max_wait }
    }
}

/// Progress reported after every successful pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollProgress {
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
    pub total: usize,
    pub all_done: bool,
}

impl From<&RefreshReport> for PollProgress {
    fn from(report: &RefreshReport) -> Self {
        Self {
            completed: report.tally.completed,
            failed: report.tally.failed,
            pending: report.tally.pending,
            total: report.tally.total,
            all_done: report.all_done,
        }
    }
}

/// Why a scheduled poll stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    AllDone,
    BudgetExhausted,
    Cancelled,
}

/// Final state of a scheduled poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollOutcome {
    /// Passes started, including failed ones.
    pub passes: u32,
    /// Progress from the last successful pass, if any succeeded.
    pub last_progress: Option<PollProgress>,
    pub stop_reason: StopReason,
}

/// Handle to a running poll.
pub struct PollHandle {
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    /// Stop scheduling further passes. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this poll, for wiring into signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to stop.
    pub async fn join(self) -> Result<PollOutcome, JoinError> {
        self.task.await
    }
}

/// Spawns poll loops over a shared [`RefreshService`].
#[derive(Clone)]
pub struct PollScheduler {
    refresh: Arc<RefreshService>,
    config: PollConfig,
}

impl PollScheduler {
    pub fn new(refresh: Arc<RefreshService>, config: PollConfig) -> Self {
        Self { refresh, config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    /// One out-of-band refresh pass. Safe to call at any time, including
    /// while a scheduled poll for the same stage is running.
    pub async fn poll_once(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<RefreshReport, PipelineError> {
        self.refresh.refresh(project_id, stage).await
    }

    /// Start polling a stage in the background.
    ///
    /// `on_progress` is called after every pass that reached the store.
    pub fn schedule<F>(&self, project_id: DbId, stage: GenerationStage, on_progress: F) -> PollHandle
    where
        F: FnMut(PollProgress) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_poll(
            Arc::clone(&self.refresh),
            self.config,
            project_id,
            stage,
            on_progress,
            cancel.clone(),
        ));
        PollHandle { cancel, task }
    }
}

async fn run_poll<F>(
    refresh: Arc<RefreshService>,
    config: PollConfig,
    project_id: DbId,
    stage: GenerationStage,
    mut on_progress: F,
    cancel: CancellationToken,
) -> PollOutcome
where
    F: FnMut(PollProgress) + Send + 'static,
{
    let started = Instant::now();
    let mut passes = 0u32;
    let mut last_progress = None;

    tracing::info!(
        project_id,
        %stage,
        interval_ms = config.interval.as_millis() as u64,
        max_wait_ms = config.max_wait.as_millis() as u64,
        "Poll started",
    );

    let stop_reason = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }

        passes += 1;
        match refresh.refresh(project_id, stage).await {
            Ok(report) => {
                let progress = PollProgress::from(&report);
                on_progress(progress);
                last_progress = Some(progress);
                if progress.all_done {
                    break StopReason::AllDone;
                }
            }
            Err(e) => {
                tracing::error!(project_id, %stage, pass = passes, error = %e, "Poll pass failed");
            }
        }

        if started.elapsed() >= config.max_wait {
            break StopReason::BudgetExhausted;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break StopReason::Cancelled,
            _ = tokio::time::sleep(config.interval) => {}
        }
    };

    tracing::info!(
        project_id,
        %stage,
        passes,
        stop_reason = ?stop_reason,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Poll stopped",
    );

    PollOutcome {
        passes,
        last_progress,
        stop_reason,
    }
}
