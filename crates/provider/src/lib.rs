//! Generation provider client.
//!
//! Talks to a predictions-style HTTP API (submit a unit of work, poll its
//! status by handle) and exposes the two operations the pipeline builds
//! on:
//!
//! - [`gateway::GenerationGateway`] submits a batch of work units over one
//!   provider session and reports a handle (and possibly an immediate
//!   result) per unit.
//! - [`prober::StatusProber`] queries one handle and normalizes the
//!   provider's answer into completed / failed / pending.
//!
//! The provider itself sits behind [`provider::GenerationProvider`];
//! [`provider::HttpProvider`] is the production implementation.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod messages;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod prober;
pub mod provider;
pub mod retry;

pub use error::{ProbeError, ProviderError, SubmissionError};
pub use gateway::{GenerationGateway, SubmittedJob, UnitSubmission};
pub use messages::NormalizedStatus;
pub use prober::StatusProber;
pub use provider::{GenerationProvider, HttpProvider, ProviderSession};
