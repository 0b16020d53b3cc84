//! Bounded retry with jittered backoff for external-call boundaries.
//!
//! Every network call the pipeline makes (search, embedding, LLM inference,
//! extraction) goes through [`retry_with_backoff`] so transient upstream
//! failures are absorbed locally without restarting earlier pipeline stages.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Retry policy for one external-call boundary.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Must be at least 1.
    pub max_attempts: u32,
    /// Fixed delay before each retry.
    pub base_delay: Duration,
    /// Upper bound of the random jitter added on top of `base_delay`.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries (single attempt).
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    fn next_delay(&self) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base_delay;
        }
        let jitter = rand::thread_rng().gen_range(0..=jitter_ms);
        self.base_delay + Duration::from_millis(jitter)
    }
}

/// Runs `operation` up to `policy.max_attempts` times, sleeping with jitter
/// between attempts. The retry is local to this call: callers never re-run
/// earlier stages because a later call needed a second attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(
    op_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);

    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts => {
                let delay = policy.next_delay();
                warn!(
                    operation = op_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
