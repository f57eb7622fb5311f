//! Errors returned across the analysis boundary

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("rate limited: {message}")]
    RateLimited {
        /// Raw `retry-after` value sent by the server, if any.
        retry_after: Option<String>,
        message: String,
    },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("content not found for {0}")]
    ContentNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisError::RateLimited { .. })
    }

    /// Server-requested delay, when the hint is a number of seconds.
    pub fn retry_hint(&self) -> Option<Duration> {
        let AnalysisError::RateLimited {
            retry_after: Some(raw),
            ..
        } = self
        else {
            return None;
        };
        let seconds: f64 = raw.trim().parse().ok()?;
        Duration::try_from_secs_f64(seconds).ok()
    }
}
