//! Timeout and bounded retry around any verifier

use std::time::Duration;

use async_trait::async_trait;

use super::{Verdict, Verifier, VerifierError};

/// Default attempts per call, including the first
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait before the first retry; doubles each attempt
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Retry parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Wraps a verifier with a per-call timeout and exponential-backoff retry.
///
/// Only transient errors are retried. When attempts run out the last error is
/// returned; a verdict is never invented.
#[derive(Debug, Clone)]
pub struct RetryingVerifier<V> {
    inner: V,
    policy: RetryPolicy,
}

impl<V: Verifier> RetryingVerifier<V> {
    pub fn new(inner: V, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

#[async_trait]
impl<V: Verifier> Verifier for RetryingVerifier<V> {
    async fn verify(&self, query: &str, candidate: &str) -> Result<Verdict, VerifierError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome =
                match tokio::time::timeout(self.policy.timeout, self.inner.verify(query, candidate))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(VerifierError::Timeout(self.policy.timeout)),
                };

            match outcome {
                Ok(verdict) => return Ok(verdict),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = self.policy.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        backoff_ms = wait.as_millis() as u64,
                        error = %e,
                        "Verifier call failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
