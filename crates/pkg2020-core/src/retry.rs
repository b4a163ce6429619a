//! Bounded retry for calls to external services.

use std::time::Duration;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    /// Double the delay after every failed attempt.
    pub exponential: bool,
}

impl RetryPolicy {
    pub const fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            exponential: false,
        }
    }

    pub const fn exponential(max_retries: u32, base: Duration) -> Self {
        Self {
            max_retries,
            delay: base,
            exponential: true,
        }
    }

    /// Wait before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.exponential {
            self.delay
                .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        } else {
            self.delay
        }
    }
}

/// Run `attempt_fn` until it succeeds, fails with a non-retryable error, or
/// the policy's retries are used up. Returns the last error on exhaustion.
pub fn retry_with_backoff<T, E>(
    label: &str,
    policy: RetryPolicy,
    mut attempt_fn: impl FnMut() -> Result<T, E>,
) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 0u32;
    loop {
        match attempt_fn() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < policy.max_retries && e.is_retryable() => {
                attempt += 1;
                log::debug!(
                    "{label}: attempt {attempt}/{} failed: {e}, retrying...",
                    policy.max_retries
                );
                std::thread::sleep(policy.backoff(attempt));
            }
            Err(e) => {
                log::error!("{label}: giving up: {e}");
                return Err(e);
            }
        }
    }
}
