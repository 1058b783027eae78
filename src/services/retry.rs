//! Bounded retries with exponential backoff for store calls.
//!
//! Only failures classified as transient are retried. The backoff sleeps the
//! calling task: 100ms, 200ms, 400ms, ... between attempts.

use crate::services::object_store::GatewayError;
use std::{future::Future, time::Duration};
use tracing::warn;

/// Attempt ceiling for uploads.
pub const UPLOAD_ATTEMPTS: u32 = 3;
/// Attempt ceiling for reads, listings, URL signing and mutations.
pub const DEFAULT_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_base_delay(Duration::from_millis(100))
    }
}

impl RetryPolicy {
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self { base_delay }
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `operation` up to `max_attempts` times.
    ///
    /// Non-retryable errors are returned immediately; when attempts run out the
    /// last error is returned.
    pub async fn execute<T, F, Fut>(
        &self,
        max_attempts: u32,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, GatewayError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if !is_retryable(&err) || attempt >= max_attempts => return Err(err),
                Err(err) => {
                    let delay = self.backoff(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "store operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Whether a store failure is worth another attempt.
///
/// Name resolution and malformed endpoints are configuration problems, and a
/// missing object is a definitive answer. Everything else, including errors the
/// adapter could not classify, is treated as transient.
pub fn is_retryable(err: &GatewayError) -> bool {
    match err {
        GatewayError::Dns(_) | GatewayError::InvalidEndpoint(_) | GatewayError::NotFound(_) => {
            false
        }
        GatewayError::ConnectionRefused(_)
        | GatewayError::Timeout(_)
        | GatewayError::Transport(_)
        | GatewayError::Other(_) => true,
        GatewayError::Status { .. } => true,
    }
}
