use std::sync::Arc;

use reelforge_db::JobStore;
use reelforge_pipeline::{RefreshService, SubmissionService};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Record store for project inputs and job status maps.
    pub store: Arc<dyn JobStore>,
    /// Submits a stage's work units and persists the initial map.
    pub submission: Arc<SubmissionService>,
    /// Runs refresh passes and reads stored status.
    pub refresh: Arc<RefreshService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
