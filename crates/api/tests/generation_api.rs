//! Integration tests for the generation submit / refresh / status endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_empty, post_json, project};
use reelforge_core::job_status::JobStatus;
use reelforge_core::stage::GenerationStage;
use serde_json::json;

const PROJECT: i64 = 1;

fn url(stage: &str, action: &str) -> String {
    if action.is_empty() {
        format!("/api/v1/projects/{PROJECT}/generation/{stage}")
    } else {
        format!("/api/v1/projects/{PROJECT}/generation/{stage}/{action}")
    }
}

// ---------------------------------------------------------------------------
// Test: submit with one fast-path completion and two pending jobs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_reports_fast_path_completions() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 3)).await;
    app.provider
        .complete_on_submit("frame-pair-0", "h1", "https://cdn/x.mp4")
        .pending_on_submit("frame-pair-1", "h2")
        .pending_on_submit("frame-pair-2", "h3");

    let response = post_empty(app.router.clone(), &url("clip", "submit")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 3);
    assert_eq!(json["completed"], 1);
    assert_eq!(json["pending"], 2);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["results"][0]["handle"], "h1");
    assert_eq!(json["results"][0]["success"], true);
    assert_eq!(json["results"][0]["artifact_url"], "https://cdn/x.mp4");
    assert_eq!(
        json["job_status_map"],
        json!({"h1": "https://cdn/x.mp4", "h2": "pending", "h3": "pending"})
    );
}

// ---------------------------------------------------------------------------
// Test: refresh persists progress, repeat refresh is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_then_repeat_refresh() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 3)).await;
    app.provider
        .complete_on_submit("frame-pair-0", "h1", "https://cdn/x.mp4")
        .pending_on_submit("frame-pair-1", "h2")
        .pending_on_submit("frame-pair-2", "h3");
    post_empty(app.router.clone(), &url("clip", "submit")).await;
    let writes_after_submit = app.store.write_count();

    app.provider
        .set_completed("h2", "https://cdn/y.mp4")
        .set_pending("h3");

    // First refresh: h2 finished.
    let response = post_empty(app.router.clone(), &url("clip", "refresh")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["completed"], 2);
    assert_eq!(json["pending"], 1);
    assert_eq!(json["changed"], true);
    assert_eq!(json["all_done"], false);
    assert_eq!(app.store.write_count(), writes_after_submit + 1);

    // Second refresh: nothing moved.
    let response = post_empty(app.router.clone(), &url("clip", "refresh")).await;
    let json = body_json(response).await;
    assert_eq!(json["changed"], false);
    assert_eq!(app.store.write_count(), writes_after_submit + 1);

    let jobs = json["jobs"].as_array().unwrap();
    let processed: Vec<_> = jobs
        .iter()
        .filter(|j| j["already_processed"] == true)
        .map(|j| j["handle"].as_str().unwrap())
        .collect();
    assert_eq!(processed, vec!["h1", "h2"]);

    // h1 was terminal at submit time and never probed.
    assert!(!app.provider.probed_handles().contains(&"h1".to_string()));
}

// ---------------------------------------------------------------------------
// Test: one rejected unit does not affect its siblings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_unit_is_isolated() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 5)).await;
    app.provider.reject_submit("frame-pair-2", 422);

    let json = body_json(post_empty(app.router.clone(), &url("clip", "submit")).await).await;

    assert_eq!(json["total"], 5);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["pending"], 4);
    let results = json["results"].as_array().unwrap();
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result["success"], i != 2, "unit {i}");
    }
    assert!(results[2]["handle"].is_null());

    let stored = app
        .store
        .snapshot(PROJECT, GenerationStage::Clip)
        .await
        .unwrap();
    assert_eq!(stored.len(), 4);
    assert!(stored.iter().all(|(_, s)| *s == JobStatus::Pending));
}

// ---------------------------------------------------------------------------
// Test: resubmitting a stage with pending jobs needs force
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resubmit_with_pending_jobs_is_a_conflict() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 2)).await;
    post_empty(app.router.clone(), &url("keyframe", "submit")).await;

    let response = post_empty(app.router.clone(), &url("keyframe", "submit")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "CONFLICT");

    let response = post_json(
        app.router.clone(),
        &url("keyframe", "submit"),
        json!({"force": true}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Test: read-only status does not contact the provider
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_reads_stored_map_only() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 2)).await;
    post_empty(app.router.clone(), &url("clip", "submit")).await;

    let response = get(app.router.clone(), &url("clip", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 2);
    assert_eq!(json["pending"], 2);
    assert_eq!(json["all_done"], false);
    assert!(app.provider.probed_handles().is_empty());
}

// ---------------------------------------------------------------------------
// Test: request-level errors map onto the failure envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_stage_returns_400() {
    let app = build_test_app();
    let response = post_empty(app.router.clone(), &url("audio", "submit")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_project_returns_404() {
    let app = build_test_app();
    let response = post_empty(app.router.clone(), &url("clip", "submit")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Project with id 1 not found");
}

#[tokio::test]
async fn refresh_before_submit_returns_404() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 1)).await;

    let response = post_empty(app.router.clone(), &url("clip", "refresh")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_prior_stage_output_returns_400() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 0)).await;

    let response = post_empty(app.router.clone(), &url("clip", "submit")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.provider.submitted_units().is_empty());
}

#[tokio::test]
async fn unreachable_provider_returns_502() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 2)).await;
    app.provider.refuse_sessions(true);

    let response = post_empty(app.router.clone(), &url("clip", "submit")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PROVIDER_UNAVAILABLE");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn unavailable_store_returns_500() {
    let app = build_test_app();
    app.store.set_unavailable(true);

    let response = post_empty(app.router.clone(), &url("clip", "refresh")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

// ---------------------------------------------------------------------------
// Test: a long submit batch is not cut off by the request timeout
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn long_submit_outlasts_request_timeout() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 8)).await;
    // Two rounds of four units at 60 s each, against a 30 s request timeout.
    app.provider.submit_latency(Duration::from_secs(60));

    let response = post_empty(app.router.clone(), &url("clip", "submit")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 8);
    assert_eq!(json["pending"], 8);
    assert_eq!(app.provider.sessions_closed(), 1);

    let stored = app
        .store
        .snapshot(PROJECT, GenerationStage::Clip)
        .await
        .unwrap();
    assert_eq!(stored.len(), 8);
}

// ---------------------------------------------------------------------------
// Test: a refresh that overruns the timeout gets the error envelope
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn slow_refresh_times_out_with_envelope() {
    let app = build_test_app();
    app.store.insert_project(project(PROJECT, 2)).await;
    post_empty(app.router.clone(), &url("clip", "submit")).await;
    app.provider.probe_latency(Duration::from_secs(60));

    let response = post_empty(app.router.clone(), &url("clip", "refresh")).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], "TIMEOUT");
    assert_eq!(json["error"], "Request timed out");
}
