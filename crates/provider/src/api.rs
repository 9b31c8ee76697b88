//! REST client for the provider's predictions endpoints.
//!
//! Wraps prediction creation and prediction lookup using [`reqwest`].
//! Bodies are returned as raw JSON; interpretation lives in
//! [`crate::messages`].

use std::time::Duration;

use crate::error::ProviderError;

/// HTTP client for one predictions API.
#[derive(Clone)]
pub struct PredictionsApi {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl PredictionsApi {
    /// Create a client reusing an existing [`reqwest::Client`].
    ///
    /// * `base_url` - Base HTTP URL without trailing slash, e.g.
    ///   `https://api.replicate.com`.
    pub fn with_client(client: reqwest::Client, base_url: String, api_token: String) -> Self {
        Self {
            client,
            base_url,
            api_token,
        }
    }

    /// Create a prediction.
    ///
    /// `model` is either `owner/name` (routed to the model's predictions
    /// endpoint) or a bare version id (sent as `version` in the body).
    /// `wait` asks the provider to hold the response open until the
    /// prediction finishes or the wait elapses, whichever comes first.
    pub async fn create_prediction(
        &self,
        model: &str,
        input: &serde_json::Value,
        wait: Duration,
    ) -> Result<serde_json::Value, ProviderError> {
        let (url, body) = if model.contains('/') {
            (
                format!("{}/v1/models/{}/predictions", self.base_url, model),
                serde_json::json!({ "input": input }),
            )
        } else {
            (
                format!("{}/v1/predictions", self.base_url),
                serde_json::json!({ "version": model, "input": input }),
            )
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_token)
            .header("Prefer", format!("wait={}", wait.as_secs().max(1)))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve the current state of one prediction.
    ///
    /// Sends a `GET /v1/predictions/{id}` request.
    pub async fn get_prediction(&self, id: &str) -> Result<serde_json::Value, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/predictions/{}", self.base_url, id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ProviderError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body.
    async fn parse_response(response: reqwest::Response) -> Result<serde_json::Value, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<serde_json::Value>().await?)
    }
}
