//! Generation job status model and the persisted status map.
//!
//! Internally every job is a [`JobStatus`] variant. On the wire (the JSON
//! object persisted per project and stage, and returned to clients) each
//! status collapses into one string slot:
//!
//! | Variant                | Wire form          |
//! |------------------------|--------------------|
//! | `Pending`              | `"pending"`        |
//! | `Failed { .. }`        | `"failed"`         |
//! | `Completed { url }`    | the artifact URL   |
//!
//! The failure reason does not survive the compact form.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::JobHandle;

// ---------------------------------------------------------------------------
// Wire sentinels
// ---------------------------------------------------------------------------

/// Wire value of a job that has not reached a terminal state.
pub const STATUS_PENDING: &str = "pending";

/// Wire value of a job that ended without an artifact.
pub const STATUS_FAILED: &str = "failed";

/// Separator every artifact URL must contain (`scheme://...`).
const URL_SCHEME_SEPARATOR: &str = "://";

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Status of one generation job.
///
/// Transitions only move forward: `Pending -> Completed` or
/// `Pending -> Failed`. See [`JobStatus::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Submitted, no terminal outcome observed yet.
    Pending,
    /// Finished with an artifact.
    Completed { url: String },
    /// Finished without an artifact.
    Failed { reason: Option<String> },
}

/// Discriminant of a [`JobStatus`], used for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatusKind {
    Pending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn completed(url: impl Into<String>) -> Self {
        Self::Completed { url: url.into() }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: Some(reason.into()),
        }
    }

    pub fn kind(&self) -> JobStatusKind {
        match self {
            Self::Pending => JobStatusKind::Pending,
            Self::Completed { .. } => JobStatusKind::Completed,
            Self::Failed { .. } => JobStatusKind::Failed,
        }
    }

    /// `Completed` and `Failed` are terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn artifact_url(&self) -> Option<&str> {
        match self {
            Self::Completed { url } => Some(url),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Apply an observed status using the forward-only transition rule.
    ///
    /// A terminal status is returned unchanged no matter what was observed.
    /// A pending status takes whatever was observed.
    pub fn advance(&self, observed: &JobStatus) -> JobStatus {
        if self.is_terminal() {
            self.clone()
        } else {
            observed.clone()
        }
    }

    /// Compact wire representation.
    pub fn as_wire(&self) -> &str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Failed { .. } => STATUS_FAILED,
            Self::Completed { url } => url,
        }
    }

    /// Decode the compact wire representation.
    ///
    /// Any string that is neither a sentinel nor an absolute URL is
    /// rejected; the record holding it is treated as corrupt.
    pub fn from_wire(value: &str) -> Result<Self, CoreError> {
        match value {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_FAILED => Ok(Self::Failed { reason: None }),
            url if is_artifact_url(url) => Ok(Self::Completed {
                url: url.to_string(),
            }),
            other => Err(CoreError::Validation(format!(
                "Unrecognized job status value '{other}'. Expected '{STATUS_PENDING}', \
                 '{STATUS_FAILED}' or an absolute URL"
            ))),
        }
    }
}

/// An artifact URL is a non-empty scheme followed by `://` and a non-empty
/// remainder.
pub fn is_artifact_url(value: &str) -> bool {
    match value.split_once(URL_SCHEME_SEPARATOR) {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && !rest.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        JobStatus::from_wire(&raw).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// JobStatusMap
// ---------------------------------------------------------------------------

/// Persisted mapping from job handle to status for one project stage.
///
/// Keys are fixed by the submission pass that created the map; later
/// operations only move values forward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobStatusMap(BTreeMap<JobHandle, JobStatus>);

impl JobStatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the status of a freshly submitted job.
    pub fn insert(&mut self, handle: impl Into<JobHandle>, status: JobStatus) {
        self.0.insert(handle.into(), status);
    }

    pub fn get(&self, handle: &str) -> Option<&JobStatus> {
        self.0.get(handle)
    }

    pub fn contains_key(&self, handle: &str) -> bool {
        self.0.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&JobHandle, &JobStatus)> {
        self.0.iter()
    }

    /// Handles whose status is still `Pending`.
    pub fn pending_handles(&self) -> Vec<JobHandle> {
        self.0
            .iter()
            .filter(|(_, status)| !status.is_terminal())
            .map(|(handle, _)| handle.clone())
            .collect()
    }

    /// Apply one observed status to an existing entry.
    ///
    /// Unknown handles are ignored. Returns `true` when the entry's
    /// [`JobStatusKind`] changed.
    pub fn observe(&mut self, handle: &str, observed: &JobStatus) -> bool {
        match self.0.get_mut(handle) {
            Some(current) => {
                let next = current.advance(observed);
                let changed = next.kind() != current.kind();
                *current = next;
                changed
            }
            None => false,
        }
    }

    /// Fold `other` into `self` entry by entry with the forward-only rule.
    ///
    /// Entries present only in `other` are not added. Returns `true` when
    /// any entry changed.
    pub fn merge_forward(&mut self, other: &JobStatusMap) -> bool {
        let mut changed = false;
        for (handle, observed) in other.iter() {
            changed |= self.observe(handle, observed);
        }
        changed
    }

    /// Compare two maps by their persisted form.
    pub fn same_wire(&self, other: &JobStatusMap) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va.as_wire() == vb.as_wire())
    }

    /// Counts per status.
    pub fn tally(&self) -> StatusTally {
        let mut tally = StatusTally {
            total: self.0.len(),
            ..StatusTally::default()
        };
        for status in self.0.values() {
            match status.kind() {
                JobStatusKind::Pending => tally.pending += 1,
                JobStatusKind::Completed => tally.completed += 1,
                JobStatusKind::Failed => tally.failed += 1,
            }
        }
        tally
    }
}

impl FromIterator<(JobHandle, JobStatus)> for JobStatusMap {
    fn from_iter<I: IntoIterator<Item = (JobHandle, JobStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// StatusTally
// ---------------------------------------------------------------------------

/// Per-status counts over a [`JobStatusMap`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub failed: usize,
}

impl StatusTally {
    /// No job is pending any more.
    pub fn all_done(&self) -> bool {
        self.pending == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
