//! The provider seam and its HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reelforge_core::stage::GenerationStage;
use reelforge_core::work_unit::WorkUnit;

use crate::api::PredictionsApi;
use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Extra time a submission request may take beyond the synchronous wait
/// before the HTTP client gives up.
const SUBMIT_TIMEOUT_GRACE: Duration = Duration::from_secs(30);

/// An external generation provider.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Establish the connection used for one batch of submissions.
    async fn open_session(&self) -> Result<Box<dyn ProviderSession>, ProviderError>;

    /// Fetch the raw status object for one job handle.
    async fn fetch_prediction(&self, handle: &str) -> Result<serde_json::Value, ProviderError>;
}

/// A connection held open for one batch submission.
///
/// Must be [`close`](ProviderSession::close)d once the batch is done.
#[async_trait]
pub trait ProviderSession: Send + Sync {
    /// Submit one unit. The response may already carry a terminal status
    /// if the provider finished inside its bounded wait.
    async fn submit(&self, unit: &WorkUnit) -> Result<serde_json::Value, ProviderError>;

    /// Release the connection. Idempotent.
    async fn close(&mut self);
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// [`GenerationProvider`] over a predictions-style HTTP API.
pub struct HttpProvider {
    config: ProviderConfig,
    /// Long-lived client for status requests.
    status_api: PredictionsApi,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.status_timeout)
            .build()?;
        let status_api =
            PredictionsApi::with_client(client, config.base_url.clone(), config.api_token.clone());
        Ok(Self { config, status_api })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl GenerationProvider for HttpProvider {
    async fn open_session(&self) -> Result<Box<dyn ProviderSession>, ProviderError> {
        if self.config.api_token.is_empty() {
            return Err(ProviderError::Unavailable(
                "PROVIDER_API_TOKEN is not set".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(self.config.sync_wait + SUBMIT_TIMEOUT_GRACE)
            .pool_max_idle_per_host(self.config.max_concurrent_submissions)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {e}")))?;

        tracing::debug!(base_url = %self.config.base_url, "Provider session opened");

        Ok(Box::new(HttpSession {
            api: Some(PredictionsApi::with_client(
                client,
                self.config.base_url.clone(),
                self.config.api_token.clone(),
            )),
            config: self.config.clone(),
        }))
    }

    async fn fetch_prediction(&self, handle: &str) -> Result<serde_json::Value, ProviderError> {
        self.status_api.get_prediction(handle).await
    }
}

/// One batch connection. Dropping the inner client releases its pool.
struct HttpSession {
    api: Option<PredictionsApi>,
    config: ProviderConfig,
}

#[async_trait]
impl ProviderSession for HttpSession {
    async fn submit(&self, unit: &WorkUnit) -> Result<serde_json::Value, ProviderError> {
        let api = self.api.as_ref().ok_or(ProviderError::SessionClosed)?;
        api.create_prediction(
            self.config.model_for(unit.stage),
            &prediction_input(unit),
            self.config.sync_wait,
        )
        .await
    }

    async fn close(&mut self) {
        if self.api.take().is_some() {
            tracing::debug!("Provider session closed");
        }
    }
}

/// Map a work unit onto the model's `input` object.
pub fn prediction_input(unit: &WorkUnit) -> serde_json::Value {
    let mut input = serde_json::Map::new();

    if let Some(prompt) = &unit.prompt {
        input.insert("prompt".into(), prompt.clone().into());
    }
    input.insert("aspect_ratio".into(), unit.shape.aspect_ratio.clone().into());

    match unit.stage {
        GenerationStage::Keyframe => {
            if let Some(format) = &unit.shape.format {
                input.insert("output_format".into(), format.clone().into());
            }
        }
        GenerationStage::Clip => {
            if let Some(first) = unit.source_image_urls.first() {
                input.insert("start_image".into(), first.clone().into());
            }
            if let Some(last) = unit.source_image_urls.get(1) {
                input.insert("end_image".into(), last.clone().into());
            }
            if let Some(duration) = unit.shape.duration_secs {
                input.insert("duration".into(), duration.into());
            }
            if let Some(resolution) = &unit.shape.resolution {
                input.insert("resolution".into(), resolution.clone().into());
            }
        }
    }

    serde_json::Value::Object(input)
}
