use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;

/// Errors from the record store. Always request-level: callers abort the
/// operation and assume nothing was persisted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted status map could not be decoded.
    #[error("Corrupt job status for project {project_id} stage {stage}: {reason}")]
    Corrupt {
        project_id: DbId,
        stage: GenerationStage,
        reason: String,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
