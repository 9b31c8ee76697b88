//! Job-completion tracking for the generation stages.
//!
//! - [`submission::SubmissionService`] submits a stage's work units and
//!   persists the initial status map.
//! - [`reconciler::BatchReconciler`] probes every pending job of a map
//!   concurrently and merges the answers.
//! - [`refresh::RefreshService`] runs one reconciliation pass against the
//!   store and writes only when something changed.
//! - [`scheduler::PollScheduler`] repeats refresh passes on an interval
//!   until every job is terminal, the budget runs out, or the caller
//!   cancels through the returned [`scheduler::PollHandle`].

pub mod error;
pub mod reconciler;
pub mod refresh;
pub mod scheduler;
pub mod submission;

pub use error::PipelineError;
pub use reconciler::{BatchReconciler, JobDetail, ReconcileOutcome};
pub use refresh::{RefreshReport, RefreshService, StatusReport};
pub use scheduler::{PollConfig, PollHandle, PollOutcome, PollProgress, PollScheduler, StopReason};
pub use submission::{SubmissionService, SubmitReport, UnitResult};
