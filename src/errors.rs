use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecapError {
    #[error("Failed to access the language model API: {0}")]
    ProviderError(String),

    #[error("Failed to access Slack API: {0}")]
    PlatformError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Summarization was cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl RecapError {
    /// Transport-level failures worth one more attempt. Anything the remote end
    /// answered (auth, quota, rate limits, bad payloads) is final.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::Timeout(_))
    }
}

impl From<SlackClientError> for RecapError {
    fn from(error: SlackClientError) -> Self {
        match error {
            // Connect/IO failures and dropped streams never reached Slack's API layer.
            SlackClientError::HttpProtocolError(_) | SlackClientError::EndOfStream(_) => {
                RecapError::HttpError(error.to_string())
            }
            _ => RecapError::PlatformError(error.to_string()),
        }
    }
}

impl From<reqwest::Error> for RecapError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RecapError::Timeout(error.to_string())
        } else {
            RecapError::HttpError(error.to_string())
        }
    }
}

impl From<anyhow::Error> for RecapError {
    fn from(error: anyhow::Error) -> Self {
        RecapError::GeneralError(error.to_string())
    }
}
