use std::time::Duration;

use tracing::warn;

use crate::error::Error;
use crate::extensions::Sleeper;
use crate::response::Response;

/// Delay before retry `n` is `backoff_unit * min(n, max_backoff_steps)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    backoff_unit: Duration,
    max_backoff_steps: u32,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::standard()
        }
    }

    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            max_backoff_steps: 3,
        }
    }

    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn backoff_unit(mut self, backoff_unit: Duration) -> Self {
        self.backoff_unit = backoff_unit;
        self
    }

    pub fn max_backoff_steps(mut self, max_backoff_steps: u32) -> Self {
        self.max_backoff_steps = max_backoff_steps.max(1);
        self
    }

    pub fn configured_max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn backoff_for_retry(&self, retry_index: usize) -> Duration {
        let steps = u32::try_from(retry_index)
            .unwrap_or(u32::MAX)
            .clamp(1, self.max_backoff_steps);
        self.backoff_unit.saturating_mul(steps)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

// `action` receives the 1-based attempt number.
pub(crate) fn run_with_retry<F>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut action: F,
) -> crate::Result<Response>
where
    F: FnMut(usize) -> crate::Result<Response>,
{
    let max_attempts = policy.configured_max_attempts();
    let mut attempts = 0_usize;

    loop {
        match action(attempts + 1) {
            Ok(mut response) => {
                response.set_retry_count(attempts);
                return Ok(response);
            }
            Err(Error::Status(mut error)) => {
                if !error.is_retryable() {
                    error.set_retry_count(attempts);
                    return Err(Error::Status(error));
                }

                attempts += 1;
                if attempts >= max_attempts {
                    error.set_retry_count(attempts);
                    return Err(Error::Status(error));
                }

                let delay = policy.backoff_for_retry(attempts);
                warn!(
                    attempt = attempts,
                    max_attempts,
                    kind = %error.kind(),
                    status = error.response().status(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying graphql request after retryable status"
                );
                sleeper.sleep(delay);
            }
            Err(error) => return Err(error),
        }
    }
}
