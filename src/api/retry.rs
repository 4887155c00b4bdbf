// Retry policy for idempotent read queries.
//
// Mutations never pass through this handler: replaying a verification or
// deletion attempt is a user decision, not a transport policy.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::api::errors::ApiError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    pub max_attempts: usize,
    /// Base delay in milliseconds for the exponential backoff
    pub base_delay_ms: u64,
    /// Upper bound on a single backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Spread delays with random jitter
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute an API operation, retrying transport failures with
    /// exponential backoff. Backend-reported operation errors surface
    /// immediately.
    pub async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let backoff = ExponentialBackoff::from_millis(self.config.base_delay_ms)
            .max_delay(Duration::from_millis(self.config.max_delay_ms));

        let strategy: Vec<Duration> = if self.config.jitter {
            backoff.map(jitter).take(self.config.max_attempts).collect()
        } else {
            backoff.take(self.config.max_attempts).collect()
        };

        debug!(
            max_attempts = self.config.max_attempts,
            "executing query with retry budget"
        );

        RetryIf::spawn(strategy, operation, |error: &ApiError| {
            let retryable = error.is_retryable();
            if retryable {
                warn!(error = %error, "query failed, will retry");
            }
            retryable
        })
        .await
    }
}
