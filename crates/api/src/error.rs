use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reelforge_core::error::CoreError;
use reelforge_db::StoreError;
use reelforge_pipeline::PipelineError;
use reelforge_provider::ProviderError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps the pipeline's request-level errors. Implements [`IntoResponse`]
/// to produce the `{ "success": false, "error": ..., "code": ... }`
/// envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reelforge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The provider could not be reached for a whole batch.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The request ran past the configured request timeout.
    #[error("Request timed out")]
    Timeout,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Core(e) => AppError::Core(e),
            PipelineError::Store(e) => AppError::Store(e),
            PipelineError::Provider(e) => AppError::Provider(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal()
                }
            },

            // --- Store errors ---
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                internal()
            }

            // --- Provider errors ---
            AppError::Provider(err) => {
                tracing::warn!(error = %err, "Provider unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_UNAVAILABLE",
                    err.to_string(),
                )
            }

            AppError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                self.to_string(),
            ),
        };

        let body = json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
