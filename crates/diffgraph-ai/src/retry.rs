//! Bounded exponential backoff around the analysis call

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::bridge::{AnalysisProvider, FileAnalysis, FileAnalysisRequest};
use super::error::AnalysisError;

/// Retry settings for rate-limited calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the uniform jitter added to each computed delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Same attempt count, no waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Delay before retrying after failed attempt number `attempt` (0-based).
    ///
    /// A server hint wins when present; otherwise `base * 2^attempt` plus
    /// jitter. Both are capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max_delay);
        }
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            self.max_jitter.mul_f64(rand::random::<f64>())
        };
        backoff.saturating_add(jitter).min(self.max_delay)
    }

    /// Run `operation` until it succeeds, fails with something other than a
    /// rate limit, or the attempts run out. Exhaustion returns the last
    /// rate-limit error.
    pub async fn with_retry<T, F, Fut>(&self, mut operation: F) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() => err,
                Err(err) => return Err(err),
            };

            attempt += 1;
            if attempt >= max_attempts {
                warn!("Rate limited on all {} attempts, giving up", max_attempts);
                return Err(err);
            }

            let delay = self.delay_for(attempt - 1, err.retry_hint());
            warn!(
                "Rate limited (attempt {}/{}), retrying in {:.1}s",
                attempt,
                max_attempts,
                delay.as_secs_f64()
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Provider decorator applying a [`RetryPolicy`] to every call
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: AnalysisProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait::async_trait]
impl<P: AnalysisProvider> AnalysisProvider for RetryingProvider<P> {
    async fn analyze_file(&self, request: &FileAnalysisRequest) -> Result<FileAnalysis, AnalysisError> {
        self.policy
            .with_retry(move || self.inner.analyze_file(request))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
