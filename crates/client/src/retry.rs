//! The resilient remote caller.
//!
//! Wraps a backend operation, classifies its failure into the taxonomy, and
//! retries the transient classes with bounded exponential backoff. Every one
//! of the exposed operations goes through here, so retry policy lives in
//! exactly one place.

use std::future::Future;
use std::time::Duration;

use strato_config::PerformanceConfig;
use strato_core::ToolError;
use tracing::{debug, error, warn};

use crate::backend::BackendError;

/// Bounded exponential backoff parameters.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub base_secs: u64,
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_secs: 1,
            min_secs: 2,
            max_secs: 10,
        }
    }
}

impl From<&PerformanceConfig> for RetryPolicy {
    fn from(performance: &PerformanceConfig) -> Self {
        Self {
            max_attempts: performance.max_retry_attempts,
            base_secs: performance.backoff_base_secs,
            min_secs: performance.backoff_min_secs,
            max_secs: performance.backoff_max_secs,
        }
    }
}

impl RetryPolicy {
    /// Backoff before the attempt after `attempt` (0-based):
    /// `base * 2^attempt` seconds, bounded to `[min, max]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential = self.base_secs.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_secs(exponential.max(self.min_secs).min(self.max_secs))
    }
}

/// Execute a backend operation with classification and bounded retry.
///
/// Successful results are returned unchanged. Failures are classified into
/// the taxonomy; Timeout/Network classes are retried up to
/// `policy.max_attempts` total attempts, everything else surfaces on the
/// first failure. The raw backend error is preserved as the cause.
pub async fn call_api<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut call: F,
) -> Result<T, ToolError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt: u32 = 0;
    loop {
        debug!(operation, attempt, "calling backend API");
        match call().await {
            Ok(result) => {
                debug!(operation, attempt, "backend API call succeeded");
                return Ok(result);
            }
            Err(backend_error) => {
                let classified = classify(operation, backend_error);
                if classified.retryable() && attempt + 1 < policy.max_attempts {
                    let delay = policy.delay(attempt);
                    warn!(
                        operation,
                        attempt,
                        kind = classified.kind.as_str(),
                        delay_secs = delay.as_secs(),
                        "transient backend failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                error!(
                    operation,
                    attempt,
                    kind = classified.kind.as_str(),
                    "backend API call failed: {}",
                    classified.message
                );
                return Err(classified);
            }
        }
    }
}

/// Map a raw backend failure onto the taxonomy.
///
/// This is the only place backend status codes are interpreted; the rest of
/// the system stays backend-agnostic.
pub fn classify(operation: &str, error: BackendError) -> ToolError {
    let classified = match &error {
        BackendError::Service {
            status,
            code,
            message,
        } => match *status {
            401 => ToolError::authentication("Authentication failed")
                .with_detail("code", code.clone())
                .with_detail("message", message.clone()),
            404 => ToolError::not_found(message.clone()).with_detail("code", code.clone()),
            429 => ToolError::rate_limit("API rate limit exceeded")
                .with_detail("code", code.clone())
                .with_detail("message", message.clone()),
            status if status >= 500 => {
                ToolError::api(format!("Backend service error: {}", message))
                    .with_detail("code", code.clone())
                    .with_detail("status", status)
            }
            status => ToolError::api(message.clone())
                .with_detail("code", code.clone())
                .with_detail("status", status),
        },
        BackendError::Timeout(_) => ToolError::timeout("Connection to the backend timed out"),
        BackendError::Transport(_) => {
            ToolError::network("Network error while communicating with the backend")
        }
    };

    classified
        .with_detail("operation", operation)
        .with_source(error)
}
