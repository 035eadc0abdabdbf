//! Fixed-backoff retry policy.
//!
//! The policy knows nothing about what it retries: any fallible closure can be
//! wrapped. Waiting goes through the `Sleeper` trait so tests can record the
//! backoff instead of blocking on it.

use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

/// Blocks the caller between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Every attempt failed. Carries the error from the final attempt.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {last}")]
pub struct RetryError<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub last: E,
}

/// Serial retries with a constant wait between failures (no growth, no jitter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }

    /// Run `op` until it succeeds or the attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. The sleeper is called between
    /// failed attempts only, never after the last one. A zero budget still
    /// makes one attempt.
    pub fn run<T, E, F>(&self, sleeper: &dyn Sleeper, mut op: F) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            info!("attempt {attempt} of {max_attempts}");
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("attempt {attempt} failed: {e}");
                    if attempt >= max_attempts {
                        return Err(RetryError { attempts: attempt, last: e });
                    }
                    info!("retrying in {}s", self.backoff.as_secs_f64());
                    sleeper.sleep(self.backoff);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    /// Three attempts, ten seconds apart.
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(10))
    }
}
