//! Error types for the provider layer.

/// Errors from talking to the provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A submission was attempted on a session that was already closed.
    #[error("Provider session is closed")]
    SessionClosed,

    /// The provider could not be configured or reached at session start.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    ///
    /// Network failures, rate limiting (429) and server errors (5xx) are
    /// transient. Other 4xx responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::ApiError { status, .. } => *status == 429 || *status >= 500,
            Self::SessionClosed => false,
            Self::Unavailable(_) => true,
        }
    }
}

/// A status probe that produced no usable answer.
///
/// Transient from the pipeline's point of view: the job stays pending and
/// is probed again on the next pass.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Provider unreachable: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed provider response: {0}")]
    Malformed(String),

    #[error("Unrecognized provider status '{0}'")]
    UnrecognizedStatus(String),
}

/// One work unit could not be submitted; no handle was obtained.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Provider accepted the request but returned no job handle")]
    MissingHandle,

    #[error("Provider returned handle '{0}' for more than one unit")]
    DuplicateHandle(String),
}
