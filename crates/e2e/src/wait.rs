//! Explicit polling policy
//!
//! Every element query and assertion in a [`Session`](crate::Session) is retried
//! against the live page until it passes or the policy's timeout elapses.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::error::{E2eError, E2eResult};

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq)]
pub enum Check<T> {
    Pass(T),
    /// Not yet; the reason is reported if the wait times out
    Fail(String),
}

impl<T> Check<T> {
    pub fn fail(reason: impl Into<String>) -> Self {
        Check::Fail(reason.into())
    }
}

/// Upper bound on any single wait
pub const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Retry-until-timeout policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::from_millis(100),
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Same interval, different budget.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Poll `check` until it passes.
    ///
    /// The check always runs at least once, even with a zero timeout. An `Err`
    /// from the check aborts the wait immediately.
    pub async fn until<T, F, Fut>(&self, what: &str, mut check: F) -> E2eResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = E2eResult<Check<T>>>,
    {
        let deadline = Instant::now() + self.timeout.min(MAX_WAIT);
        let mut polls = 0u32;

        loop {
            polls += 1;
            let last = match check().await? {
                Check::Pass(value) => return Ok(value),
                Check::Fail(reason) => reason,
            };

            let now = Instant::now();
            if now >= deadline {
                return Err(E2eError::Timeout {
                    what: what.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                    last,
                });
            }

            trace!(what, polls, reason = %last, "Condition not met yet");
            tokio::time::sleep(self.interval.min(deadline - now)).await;
        }
    }
}
