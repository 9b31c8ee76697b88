//! Status Prober: one status request per job handle.

use std::sync::Arc;

use crate::error::ProbeError;
use crate::messages::{normalize, parse_prediction, NormalizedStatus};
use crate::provider::GenerationProvider;

/// Queries a [`GenerationProvider`] for the status of single jobs.
#[derive(Clone)]
pub struct StatusProber {
    provider: Arc<dyn GenerationProvider>,
}

impl StatusProber {
    pub fn new(provider: Arc<dyn GenerationProvider>) -> Self {
        Self { provider }
    }

    /// Query the provider for `handle` and normalize the answer.
    ///
    /// Any transport failure, malformed body, or unknown status value is a
    /// [`ProbeError`]; callers treat it as "no news" for this pass.
    pub async fn probe(&self, handle: &str) -> Result<NormalizedStatus, ProbeError> {
        let body = self.provider.fetch_prediction(handle).await?;
        let prediction = parse_prediction(body)?;

        if let Some(id) = prediction.id.as_deref() {
            if id != handle {
                return Err(ProbeError::Malformed(format!(
                    "asked for '{handle}', provider answered for '{id}'"
                )));
            }
        }

        normalize(&prediction)
    }
}
