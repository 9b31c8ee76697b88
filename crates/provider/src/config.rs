//! Provider configuration loaded from environment variables.

use std::time::Duration;

use reelforge_core::stage::GenerationStage;

use crate::retry::RetryConfig;

/// Upper bound the predictions API accepts for a synchronous wait.
pub const MAX_SYNC_WAIT_SECS: u64 = 60;

/// Connection settings for the generation provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base HTTP URL, e.g. `https://api.replicate.com`.
    pub base_url: String,
    /// Bearer token sent on every request.
    pub api_token: String,
    /// Model used for keyframe images (`owner/name` or a version id).
    pub keyframe_model: String,
    /// Model used for video clips.
    pub clip_model: String,
    /// How long a submission may block waiting for a synchronous result.
    /// Independent of any polling budget.
    pub sync_wait: Duration,
    /// Timeout for status requests.
    pub status_timeout: Duration,
    /// At most this many submissions in flight per batch.
    pub max_concurrent_submissions: usize,
    /// Backoff for transient submission errors.
    pub retry: RetryConfig,
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                         |
    /// |-------------------------------|---------------------------------|
    /// | `PROVIDER_BASE_URL`           | `https://api.replicate.com`     |
    /// | `PROVIDER_API_TOKEN`          | empty                           |
    /// | `PROVIDER_KEYFRAME_MODEL`     | `black-forest-labs/flux-schnell`|
    /// | `PROVIDER_CLIP_MODEL`         | `kwaivgi/kling-v2.1`            |
    /// | `PROVIDER_SYNC_WAIT_SECS`     | `60` (clamped to 1..=60)        |
    /// | `PROVIDER_STATUS_TIMEOUT_SECS`| `30`                            |
    /// | `PROVIDER_MAX_CONCURRENCY`    | `4`                             |
    pub fn from_env() -> Self {
        let base_url = std::env::var("PROVIDER_BASE_URL")
            .unwrap_or_else(|_| "https://api.replicate.com".into())
            .trim_end_matches('/')
            .to_string();

        let api_token = std::env::var("PROVIDER_API_TOKEN").unwrap_or_default();

        let keyframe_model = std::env::var("PROVIDER_KEYFRAME_MODEL")
            .unwrap_or_else(|_| "black-forest-labs/flux-schnell".into());

        let clip_model =
            std::env::var("PROVIDER_CLIP_MODEL").unwrap_or_else(|_| "kwaivgi/kling-v2.1".into());

        let sync_wait_secs = env_u64("PROVIDER_SYNC_WAIT_SECS", MAX_SYNC_WAIT_SECS)
            .clamp(1, MAX_SYNC_WAIT_SECS);

        let status_timeout_secs = env_u64("PROVIDER_STATUS_TIMEOUT_SECS", 30);

        let max_concurrent_submissions = env_u64("PROVIDER_MAX_CONCURRENCY", 4).max(1) as usize;

        Self {
            base_url,
            api_token,
            keyframe_model,
            clip_model,
            sync_wait: Duration::from_secs(sync_wait_secs),
            status_timeout: Duration::from_secs(status_timeout_secs),
            max_concurrent_submissions,
            retry: RetryConfig::default(),
        }
    }

    /// Model identifier for a stage.
    pub fn model_for(&self, stage: GenerationStage) -> &str {
        match stage {
            GenerationStage::Keyframe => &self.keyframe_model,
            GenerationStage::Clip => &self.clip_model,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
