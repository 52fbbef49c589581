//! Request pacing and retry backoff
//!
//! This module handles:
//! - Minimum spacing between page requests across the whole run
//! - Exponential backoff for retried operations
//! - Honoring server-supplied wait hints (HTTP 429 Retry-After)

use crate::{HarvestError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Backoff parameters for a retried operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,

    /// Delay before the first unhinted retry
    pub base_delay: Duration,

    /// Ceiling the exponential schedule never exceeds
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }
}

/// State of one retried operation
///
/// Created per `retry_with_backoff` call and discarded on success or final
/// failure.
#[derive(Debug, Default)]
struct RetryContext {
    /// Failures observed so far
    attempt: u32,

    /// Message of the most recent failure
    last_error: Option<String>,

    /// Server wait hint carried by the most recent failure, if any
    retry_after_hint_seconds: Option<u64>,
}

/// Enforces inter-request spacing and runs retry loops
///
/// The "time of last request" lives on the instance, never in a global;
/// callers that need pacing receive the scheduler explicitly.
pub struct RateScheduler {
    last_request: Option<Instant>,
}

impl RateScheduler {
    pub fn new() -> Self {
        Self { last_request: None }
    }

    /// Sleeps just long enough that `min_interval` has elapsed since the
    /// previous `delay` call
    ///
    /// Returns immediately when the interval has already passed; the first
    /// call never sleeps. Only this method mutates the last-request state.
    pub async fn delay(&mut self, min_interval: Duration) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                let wait = min_interval - elapsed;
                tracing::trace!("Pacing: sleeping {:?} before next request", wait);
                tokio::time::sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Invokes `op` until it succeeds or the retries are spent
    ///
    /// A failure carrying a server wait hint sleeps exactly the hinted
    /// duration and does not advance the exponential schedule; any other
    /// failure sleeps `min(base_delay * 2^n, max_delay)` for the nth such
    /// failure. The hint still consumes a retry so the loop terminates.
    /// After `max_retries` retries the last failure is returned unmodified.
    pub async fn retry_with_backoff<T, F, Fut>(&mut self, mut op: F, policy: &RetryPolicy) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut ctx = RetryContext::default();
        let mut backoff_exponent = 0u32;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if ctx.attempt >= policy.max_retries {
                        tracing::warn!(
                            "Retries exhausted after {} attempts: {}",
                            ctx.attempt + 1,
                            error
                        );
                        return Err(error);
                    }

                    ctx.attempt += 1;
                    ctx.retry_after_hint_seconds = retry_after_hint(&error).map(|d| d.as_secs());
                    ctx.last_error = Some(error.to_string());

                    let wait = match ctx.retry_after_hint_seconds {
                        Some(seconds) => {
                            tracing::info!(
                                "Server requested a {}s wait; honoring it (retry {}/{})",
                                seconds,
                                ctx.attempt,
                                policy.max_retries
                            );
                            Duration::from_secs(seconds)
                        }
                        None => {
                            let exp = policy
                                .base_delay
                                .saturating_mul(2u32.saturating_pow(backoff_exponent));
                            backoff_exponent += 1;
                            let wait = exp.min(policy.max_delay);
                            tracing::warn!(
                                "Attempt {} failed ({}), retrying in {:?} ({}/{})",
                                ctx.attempt,
                                ctx.last_error.as_deref().unwrap_or("unknown"),
                                wait,
                                ctx.attempt,
                                policy.max_retries
                            );
                            wait
                        }
                    };

                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

impl Default for RateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a server-supplied wait hint from an error, if it carries one
pub fn retry_after_hint(error: &HarvestError) -> Option<Duration> {
    match error {
        HarvestError::RateLimited {
            retry_after_seconds: Some(seconds),
        } => Some(Duration::from_secs(*seconds)),
        HarvestError::Driver(crate::browser::DriverError::RateLimited {
            retry_after_seconds: Some(seconds),
        }) => Some(Duration::from_secs(*seconds)),
        _ => None,
    }
}
