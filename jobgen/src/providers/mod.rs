pub mod anthropic;
pub mod classify;
pub mod google;
pub mod openai;
pub mod sanitize;

use async_trait::async_trait;

/// Errors from a single provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Structured error code from the body (`error.status`, `error.type` or `error.code`).
        code: Option<String>,
        /// The full message, before the display cap, named quota exhaustion.
        quota_marker: bool,
    },

    /// Request URL stripped, see the `From` impl.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("{provider} did not answer within {after_ms}ms")]
    Timeout { provider: String, after_ms: u64 },

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ProviderError {
    // Request URLs can carry credentials; they must not reach logs or clients.
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.without_url())
    }
}

/// A text-generation backend.
///
/// Implementations send the already-assembled prompt as a single user turn and
/// hand back the raw reply text. Parsing the reply is the caller's job.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable identifier used in logs and in terminal errors.
    fn name(&self) -> &str;

    /// Whether a credential is present. Unconfigured providers are skipped
    /// without a call.
    fn is_configured(&self) -> bool;

    /// Generate text for `prompt`. Blank replies surface as
    /// [`ProviderError::EmptyResponse`].
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Reject blank text the same way for every adapter.
pub(crate) fn non_empty(provider: &str, text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse {
            provider: provider.to_string(),
        })
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_empty_response() {
        let err = non_empty("deepseek", "  \n\t".into()).unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse { ref provider } if provider == "deepseek"));
        assert_eq!(err.to_string(), "deepseek returned an empty response");
    }

    #[test]
    fn text_passes_through_untouched() {
        assert_eq!(non_empty("google", " {\"a\":1} ".into()).unwrap(), " {\"a\":1} ");
    }
}
