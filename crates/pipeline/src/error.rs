use reelforge_core::error::CoreError;
use reelforge_db::StoreError;
use reelforge_provider::ProviderError;

/// Request-level failures of a pipeline operation.
///
/// Per-job problems (a rejected unit, a failed probe) never surface here;
/// they are reported inside the operation's result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Bad input, missing entity, or conflicting state.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The record store failed; nothing is assumed persisted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The provider session for a batch could not be opened.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
