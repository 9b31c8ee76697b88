//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests call `IntoResponse` directly on `AppError` values; no HTTP
//! server is needed.

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use reelforge_api::error::AppError;
use reelforge_core::error::CoreError;
use reelforge_db::StoreError;
use reelforge_pipeline::PipelineError;
use reelforge_provider::ProviderError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::NotFound maps to 404 with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::NotFound {
        entity: "Project",
        id: 42,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Project with id 42 not found");
}

// ---------------------------------------------------------------------------
// Test: CoreError::Conflict maps to 409 with CONFLICT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::Conflict("stage busy".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "stage busy");
}

// ---------------------------------------------------------------------------
// Test: pipeline errors keep their classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pipeline_validation_error_returns_400() {
    let err = AppError::from(PipelineError::Core(CoreError::Validation(
        "no frame pairs".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn pipeline_provider_error_returns_502() {
    let err = AppError::from(PipelineError::Provider(ProviderError::Unavailable(
        "token missing".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROVIDER_UNAVAILABLE");
}

// ---------------------------------------------------------------------------
// Test: store errors are sanitized to 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_error_returns_500_without_details() {
    let err = AppError::from(PipelineError::Store(StoreError::Unavailable(
        "connection refused at 10.0.0.3".into(),
    )));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Test: pipeline errors convert into the matching AppError variant
// ---------------------------------------------------------------------------

#[test]
fn pipeline_errors_keep_their_layer() {
    assert_matches!(
        AppError::from(PipelineError::Core(CoreError::Conflict("busy".into()))),
        AppError::Core(CoreError::Conflict(_))
    );
    assert_matches!(
        AppError::from(PipelineError::Store(StoreError::Unavailable("down".into()))),
        AppError::Store(StoreError::Unavailable(_))
    );
    assert_matches!(
        AppError::from(PipelineError::Provider(ProviderError::SessionClosed)),
        AppError::Provider(ProviderError::SessionClosed)
    );
}

// ---------------------------------------------------------------------------
// Test: timeouts map to 408 with TIMEOUT code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timeout_returns_408() {
    let (status, json) = error_to_response(AppError::Timeout).await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "TIMEOUT");
}
