//! Scripted [`GenerationProvider`] for tests.
//!
//! Submissions and status answers are configured per unit reference and
//! per handle. Every call is recorded so tests can assert which handles
//! were probed and that sessions were released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reelforge_core::work_unit::WorkUnit;
use serde_json::json;

use crate::error::ProviderError;
use crate::provider::{GenerationProvider, ProviderSession};

/// How the provider answers a submission for one unit.
#[derive(Debug, Clone)]
enum SubmitScript {
    Respond(serde_json::Value),
    Reject { status: u16 },
}

#[derive(Default)]
struct ScriptState {
    submissions: HashMap<String, SubmitScript>,
    statuses: HashMap<String, serde_json::Value>,
    refuse_sessions: bool,
    submit_latency: Duration,
    probe_latency: Duration,
    sessions_opened: usize,
    sessions_closed: usize,
    submitted_units: Vec<String>,
    probed_handles: Vec<String>,
}

/// Provider whose answers are set up front by the test.
///
/// Unscripted units are accepted as pending with handle `job-<unit_ref>`.
/// Unscripted handles answer status requests with HTTP 404.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ---- submission scripts ----

    /// The unit finishes inside the bounded wait.
    pub fn complete_on_submit(&self, unit_ref: &str, handle: &str, url: &str) -> &Self {
        self.script_submit(
            unit_ref,
            json!({"id": handle, "status": "succeeded", "output": url}),
        )
    }

    /// The unit is accepted and still running when the wait elapses.
    pub fn pending_on_submit(&self, unit_ref: &str, handle: &str) -> &Self {
        self.script_submit(unit_ref, json!({"id": handle, "status": "processing"}))
    }

    /// The unit is accepted and fails inside the bounded wait.
    pub fn fail_on_submit(&self, unit_ref: &str, handle: &str, reason: &str) -> &Self {
        self.script_submit(
            unit_ref,
            json!({"id": handle, "status": "failed", "error": reason}),
        )
    }

    /// The submission request itself is rejected with an HTTP status.
    pub fn reject_submit(&self, unit_ref: &str, status: u16) -> &Self {
        self.state()
            .submissions
            .insert(unit_ref.to_string(), SubmitScript::Reject { status });
        self
    }

    /// Answer the submission with an arbitrary body.
    pub fn script_submit(&self, unit_ref: &str, body: serde_json::Value) -> &Self {
        self.state()
            .submissions
            .insert(unit_ref.to_string(), SubmitScript::Respond(body));
        self
    }

    /// Make `open_session` fail.
    pub fn refuse_sessions(&self, refuse: bool) -> &Self {
        self.state().refuse_sessions = refuse;
        self
    }

    /// Hold every submission for `latency` before answering, like the
    /// provider's bounded synchronous wait.
    pub fn submit_latency(&self, latency: Duration) -> &Self {
        self.state().submit_latency = latency;
        self
    }

    /// Hold every status request for `latency` before answering.
    pub fn probe_latency(&self, latency: Duration) -> &Self {
        self.state().probe_latency = latency;
        self
    }

    // ---- status scripts ----

    pub fn set_status(&self, handle: &str, body: serde_json::Value) -> &Self {
        self.state().statuses.insert(handle.to_string(), body);
        self
    }

    pub fn set_pending(&self, handle: &str) -> &Self {
        self.set_status(handle, json!({"id": handle, "status": "processing"}))
    }

    pub fn set_completed(&self, handle: &str, url: &str) -> &Self {
        self.set_status(
            handle,
            json!({"id": handle, "status": "succeeded", "output": url}),
        )
    }

    pub fn set_failed(&self, handle: &str, reason: &str) -> &Self {
        self.set_status(
            handle,
            json!({"id": handle, "status": "failed", "error": reason}),
        )
    }

    /// Status requests for `handle` fail at the transport level.
    pub fn set_unreachable(&self, handle: &str) -> &Self {
        self.state().statuses.remove(handle);
        self
    }

    // ---- recorded calls ----

    pub fn sessions_opened(&self) -> usize {
        self.state().sessions_opened
    }

    pub fn sessions_closed(&self) -> usize {
        self.state().sessions_closed
    }

    /// Unit references in the order their submissions were attempted.
    pub fn submitted_units(&self) -> Vec<String> {
        self.state().submitted_units.clone()
    }

    /// Handles in the order they were probed.
    pub fn probed_handles(&self) -> Vec<String> {
        self.state().probed_handles.clone()
    }

    pub fn clear_probe_log(&self) {
        self.state().probed_handles.clear();
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    async fn open_session(&self) -> Result<Box<dyn ProviderSession>, ProviderError> {
        let mut state = self.state();
        if state.refuse_sessions {
            return Err(ProviderError::Unavailable("scripted refusal".into()));
        }
        state.sessions_opened += 1;
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
            open: true,
        }))
    }

    async fn fetch_prediction(&self, handle: &str) -> Result<serde_json::Value, ProviderError> {
        let latency = self.state().probe_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        state.probed_handles.push(handle.to_string());
        state
            .statuses
            .get(handle)
            .cloned()
            .ok_or_else(|| ProviderError::ApiError {
                status: 404,
                body: format!("prediction {handle} not found"),
            })
    }
}

struct ScriptedSession {
    state: Arc<Mutex<ScriptState>>,
    open: bool,
}

impl ScriptedSession {
    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ProviderSession for ScriptedSession {
    async fn submit(&self, unit: &WorkUnit) -> Result<serde_json::Value, ProviderError> {
        if !self.open {
            return Err(ProviderError::SessionClosed);
        }
        let latency = self.state().submit_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        state.submitted_units.push(unit.unit_ref.clone());
        match state.submissions.get(&unit.unit_ref).cloned() {
            Some(SubmitScript::Respond(body)) => Ok(body),
            Some(SubmitScript::Reject { status }) => Err(ProviderError::ApiError {
                status,
                body: "scripted rejection".into(),
            }),
            None => Ok(json!({
                "id": format!("job-{}", unit.unit_ref),
                "status": "starting",
            })),
        }
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.state().sessions_closed += 1;
        }
    }
}
