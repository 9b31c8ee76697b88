//! Provider response shapes and their normalization.
//!
//! Both the submission response (fast path) and the status response (slow
//! path) are prediction objects of the shape
//! `{"id": ..., "status": ..., "output": ..., "error": ...}`. Providers
//! disagree on details, so parsing is lenient about where the status and
//! the artifact URL live and strict about what the status means.

use reelforge_core::job_status::{is_artifact_url, JobStatus};
use serde::Deserialize;

use crate::error::ProbeError;

/// Status values meaning the job produced its artifact.
const COMPLETED_STATUSES: &[&str] = &["succeeded", "successful", "success", "completed", "complete"];

/// Status values meaning the job ended without an artifact.
const FAILED_STATUSES: &[&str] = &["failed", "failure", "error", "canceled", "cancelled", "aborted"];

/// Status values meaning the job is still queued or running.
const PENDING_STATUSES: &[&str] = &[
    "starting",
    "queued",
    "in_queue",
    "processing",
    "in_progress",
    "running",
    "pending",
];

/// Object keys that may hold the artifact URL inside `output`.
const OUTPUT_URL_KEYS: &[&str] = &["url", "video", "image", "uri", "output"];

/// A prediction object as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    /// Provider-assigned job handle.
    #[serde(default, alias = "request_id", alias = "prediction_id")]
    pub id: Option<String>,
    #[serde(default, alias = "state")]
    pub status: Option<String>,
    /// String, array of strings, or an object carrying a URL.
    #[serde(default)]
    pub output: serde_json::Value,
    /// String or `{"message": ...}`.
    #[serde(default)]
    pub error: serde_json::Value,
}

/// Provider status reduced to the three outcomes the pipeline cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedStatus {
    Completed { url: String },
    Failed { reason: String },
    Pending,
}

impl NormalizedStatus {
    pub fn to_job_status(&self) -> JobStatus {
        match self {
            Self::Completed { url } => JobStatus::completed(url.clone()),
            Self::Failed { reason } => JobStatus::failed(reason.clone()),
            Self::Pending => JobStatus::Pending,
        }
    }
}

/// Parse a raw response body into a [`Prediction`].
pub fn parse_prediction(body: serde_json::Value) -> Result<Prediction, ProbeError> {
    if !body.is_object() {
        return Err(ProbeError::Malformed(format!(
            "expected a JSON object, got {body}"
        )));
    }
    serde_json::from_value(body).map_err(|e| ProbeError::Malformed(e.to_string()))
}

/// Reduce a prediction to a [`NormalizedStatus`].
pub fn normalize(prediction: &Prediction) -> Result<NormalizedStatus, ProbeError> {
    let raw = prediction
        .status
        .as_deref()
        .ok_or_else(|| ProbeError::Malformed("response carries no status".into()))?;
    let status = raw.trim().to_ascii_lowercase();

    if COMPLETED_STATUSES.contains(&status.as_str()) {
        return match extract_artifact_url(&prediction.output) {
            Some(url) => Ok(NormalizedStatus::Completed { url }),
            None => Err(ProbeError::Malformed(format!(
                "status '{raw}' without an artifact URL in output"
            ))),
        };
    }

    if FAILED_STATUSES.contains(&status.as_str()) {
        let reason = extract_error(&prediction.error)
            .unwrap_or_else(|| format!("provider reported status '{raw}'"));
        return Ok(NormalizedStatus::Failed { reason });
    }

    if PENDING_STATUSES.contains(&status.as_str()) {
        return Ok(NormalizedStatus::Pending);
    }

    Err(ProbeError::UnrecognizedStatus(raw.to_string()))
}

/// Find the first artifact URL in an `output` value.
pub fn extract_artifact_url(output: &serde_json::Value) -> Option<String> {
    match output {
        serde_json::Value::String(s) if is_artifact_url(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(extract_artifact_url),
        serde_json::Value::Object(fields) => OUTPUT_URL_KEYS
            .iter()
            .filter_map(|key| fields.get(*key))
            .find_map(extract_artifact_url),
        _ => None,
    }
}

fn extract_error(error: &serde_json::Value) -> Option<String> {
    match error {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Object(fields) => fields
            .get("message")
            .or_else(|| fields.get("detail"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        _ => None,
    }
}
