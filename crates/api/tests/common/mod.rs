#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use reelforge_core::inputs::{FramePair, ProjectInputs, Scene};
use reelforge_db::memory::InMemoryJobStore;
use reelforge_pipeline::{BatchReconciler, RefreshService, SubmissionService};
use reelforge_provider::config::ProviderConfig;
use reelforge_provider::mock::ScriptedProvider;
use reelforge_provider::retry::RetryConfig;
use reelforge_provider::{GenerationGateway, StatusProber};
use tower::ServiceExt;

use reelforge_api::config::ServerConfig;
use reelforge_api::router::build_app_router;
use reelforge_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        provider: ProviderConfig::from_env(),
    }
}

/// Everything a test needs to script the provider and inspect the store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryJobStore>,
    pub provider: ScriptedProvider,
}

/// Build the full application router over an in-memory store and a
/// scripted provider.
///
/// Uses the same [`build_app_router`] as `main.rs`, so integration tests
/// exercise the production middleware stack. Submission retries are
/// disabled to keep rejection tests instant.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(InMemoryJobStore::new());
    let provider = ScriptedProvider::new();
    let provider_arc = Arc::new(provider.clone());

    let gateway = GenerationGateway::new(provider_arc.clone()).with_retry(RetryConfig {
        max_attempts: 1,
        ..RetryConfig::default()
    });
    let reconciler = BatchReconciler::new(StatusProber::new(provider_arc));

    let state = AppState {
        store: store.clone(),
        submission: Arc::new(SubmissionService::new(store.clone(), Arc::new(gateway))),
        refresh: Arc::new(RefreshService::new(store.clone(), reconciler)),
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        provider,
    }
}

/// A project with `count` scenes and `count` frame pairs.
pub fn project(project_id: i64, count: i32) -> ProjectInputs {
    ProjectInputs {
        project_id,
        scenes: (0..count)
            .map(|i| Scene {
                position: i,
                description: format!("Scene {i}"),
                camera: None,
                duration_secs: Some(5.0),
            })
            .collect(),
        frame_pairs: (0..count)
            .map(|i| FramePair {
                position: i,
                first_frame_url: format!("https://cdn/{i}a.png"),
                last_frame_url: format!("https://cdn/{i}b.png"),
            })
            .collect(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
