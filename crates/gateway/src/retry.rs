//! Retry executor with exponential back-off and jitter.
//!
//! A [`DeliveryResult`] with `Failure` status is treated as a retryable
//! error. A `Skipped` result (e.g. no email on record) is a permanent
//! condition and is not retried. An `Err` from the operation is normalised
//! into a `Failure` result and may be retried; the executor itself never
//! returns an error.
//!
//! Back-off formula:
//!
//! ```text
//! delay(attempt) = min(initial_delay * factor^(attempt - 1) + jitter, max_delay)
//! jitter         = random(0, initial_delay)     // re-sampled per attempt
//! ```

use std::future::Future;
use std::time::Duration;

use notification_gateway_config::RetryConfig;
use notification_gateway_types::{DeliveryResult, DeliveryStatus};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Back-off parameters, validated at config load.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub backoff_factor: f64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Compute the delay after a failed attempt (1-indexed).
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63);
        let base = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent as i32);
        let base = if base.is_finite() && base >= 0.0 {
            base as u64
        } else {
            self.max_delay_ms
        };

        let jitter = if self.initial_delay_ms > 0 {
            rand::rng().random_range(0..self.initial_delay_ms)
        } else {
            0
        };

        Duration::from_millis(base.saturating_add(jitter).min(self.max_delay_ms))
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_delay_ms: config.initial_delay_ms,
            backoff_factor: config.backoff_factor,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

/// Executes a dispatch operation with bounded retries.
///
/// The inter-attempt sleep selects against the shutdown token so the
/// consumer worker unblocks promptly on drain; on cancellation the last
/// observed failure is returned without further attempts.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    shutdown: CancellationToken,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy, shutdown: CancellationToken) -> Self {
        Self { policy, shutdown }
    }

    /// Execute `operation` with automatic retry on `Failure`.
    ///
    /// `description` has the form `"provider/CHANNEL notification_id=…"` and
    /// is used both for log lines and to attribute synthesised failure
    /// results when the operation returns an error.
    pub async fn execute<F, Fut>(&self, mut operation: F, description: &str) -> DeliveryResult
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<DeliveryResult>>,
    {
        let max = self.policy.max_attempts;
        let mut last_result: Option<DeliveryResult> = None;
        let mut interrupted = false;

        for attempt in 1..=max {
            match operation().await {
                Ok(result) => {
                    if result.is_success() {
                        if attempt > 1 {
                            info!(attempt, max, description, "retry succeeded");
                        }
                        return result;
                    }

                    // Skipped is permanent, retrying cannot change it
                    if result.status == DeliveryStatus::Skipped {
                        return result;
                    }

                    warn!(
                        attempt,
                        max,
                        description,
                        error = result.error_message.as_deref().unwrap_or(""),
                        "delivery failed"
                    );
                    last_result = Some(result);
                }
                Err(e) => {
                    error!(attempt, max, description, error = %e, "unexpected error during delivery");
                    let (provider, channel) = split_description(description);
                    last_result = Some(DeliveryResult::failure(
                        provider,
                        channel,
                        format!("Exception: {e}"),
                        0,
                    ));
                }
            }

            if attempt < max {
                let delay = self.policy.backoff_delay(attempt);
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        warn!(description, "retry back-off interrupted by shutdown");
                        interrupted = true;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        if !interrupted {
            error!(max, description, "all retry attempts exhausted");
        }

        last_result.unwrap_or_else(|| {
            let (provider, channel) = split_description(description);
            DeliveryResult::failure(provider, channel, "retry loop exited without result", 0)
        })
    }
}

/// Parse `"provider/CHANNEL …"` back into its parts for synthesised results.
fn split_description(description: &str) -> (String, String) {
    let Some((provider, rest)) = description.split_once('/') else {
        return ("unknown".to_string(), "unknown".to_string());
    };
    let channel = rest.split_whitespace().next().unwrap_or("unknown");
    if provider.is_empty() {
        return ("unknown".to_string(), channel.to_string());
    }
    (provider.to_string(), channel.to_string())
}
