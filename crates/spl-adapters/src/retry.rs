//! Bounded retry for external calls.
//!
//! The default policy performs exactly one retry on a transient failure,
//! keeping worst-case latency bounded.

use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{AdapterError, AdapterResult};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);

        let backoff = if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..1.5);
            capped * factor
        } else {
            capped
        };

        Duration::from_millis(backoff as u64)
    }

    pub async fn execute<F, Fut, T>(&self, mut f: F) -> AdapterResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = AdapterResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let backoff = self.calculate_backoff(attempt - 1);
                debug!(attempt = attempt + 1, ?backoff, "Retrying external call");
                tokio::time::sleep(backoff).await;
            }

            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    warn!(
                        attempt = attempt + 1,
                        max = self.max_attempts,
                        error = %e,
                        "External call failed"
                    );
                    if !e.is_retryable() {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| AdapterError::RequestFailed("all retry attempts failed".into())))
    }
}

pub async fn with_retry<F, Fut, T>(f: F) -> AdapterResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = AdapterResult<T>>,
{
    RetryPolicy::default().execute(f).await
}
