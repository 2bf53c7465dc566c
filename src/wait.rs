// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Convergence waiter for asynchronous reconciliation.
//!
//! Every check in the suite follows the same shape: perform a mutation, then
//! poll cluster or HTTP state until it reflects the mutation or a deadline
//! passes. [`Poll::until`] implements that once:
//!
//! - the predicate is invoked immediately, then after each fixed interval
//! - an `Ok` from the predicate ends the wait with that value
//! - an `Err` means "not converged yet" and is retried
//! - an `Err` built with [`terminal`] stops the wait at once
//! - when the deadline passes the last error is reported in [`WaitError::Timeout`]
//!
//! Time is measured with `tokio::time::Instant`, so tests may pause the clock.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of a wait that did not converge.
#[derive(Error, Debug)]
pub enum WaitError {
    /// The deadline passed without the predicate succeeding
    #[error("timed out after {elapsed:?} ({attempts} attempts) waiting for {what}: {last}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Number of predicate invocations
        attempts: u32,
        /// Time from the first invocation until giving up
        elapsed: Duration,
        /// Error reported by the last invocation
        last: String,
    },

    /// The predicate returned a terminal error
    #[error("gave up waiting for {what} after {attempts} attempts: {reason}")]
    Aborted {
        /// What was being waited for
        what: String,
        /// Number of predicate invocations
        attempts: u32,
        /// Terminal error message
        reason: String,
    },
}

impl WaitError {
    /// Number of predicate invocations before the wait ended.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. } | Self::Aborted { attempts, .. } => *attempts,
        }
    }

    /// Last error message observed from the predicate.
    #[must_use]
    pub fn last_error(&self) -> &str {
        match self {
            Self::Timeout { last, .. } => last,
            Self::Aborted { reason, .. } => reason,
        }
    }
}

/// Marker for predicate errors that must not be retried.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct Terminal(String);

/// Wrap an error so that [`Poll::until`] fails immediately instead of retrying.
pub fn terminal(err: impl Into<anyhow::Error>) -> anyhow::Error {
    anyhow::Error::new(Terminal(format!("{:#}", err.into())))
}

/// A fixed timeout and poll interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    /// Maximum time to wait
    pub timeout: Duration,
    /// Sleep between attempts
    pub interval: Duration,
}

impl Poll {
    /// Create a poll with the given timeout and interval.
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Poll `probe` until it returns `Ok` or the timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Timeout`] with the last observed error when the
    /// deadline passes, or [`WaitError::Aborted`] when the probe returns an
    /// error created with [`terminal`].
    pub async fn until<T, F, Fut>(&self, what: &str, mut probe: F) -> Result<T, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match probe().await {
                Ok(value) => {
                    debug!(
                        what = what,
                        attempts = attempts,
                        elapsed = ?start.elapsed(),
                        "Condition met"
                    );
                    return Ok(value);
                }
                Err(err) => {
                    if err.downcast_ref::<Terminal>().is_some() {
                        warn!(
                            what = what,
                            attempts = attempts,
                            error = %err,
                            "Terminal error while waiting"
                        );
                        return Err(WaitError::Aborted {
                            what: what.to_string(),
                            attempts,
                            reason: err.to_string(),
                        });
                    }

                    let now = Instant::now();
                    if now >= deadline {
                        let elapsed = now.duration_since(start);
                        warn!(
                            what = what,
                            attempts = attempts,
                            elapsed = ?elapsed,
                            error = %format!("{err:#}"),
                            "Timed out waiting for condition"
                        );
                        return Err(WaitError::Timeout {
                            what: what.to_string(),
                            attempts,
                            elapsed,
                            last: format!("{err:#}"),
                        });
                    }

                    debug!(
                        what = what,
                        attempt = attempts,
                        elapsed = ?now.duration_since(start),
                        error = %format!("{err:#}"),
                        "Condition not met yet, retrying"
                    );

                    let remaining = deadline.saturating_duration_since(now);
                    tokio::time::sleep(self.interval.min(remaining)).await;
                }
            }
        }
    }

    /// Poll until `probe` returns `Ok(true)`.
    ///
    /// `Ok(false)` and errors are both treated as "not converged".
    ///
    /// # Errors
    ///
    /// Same as [`Poll::until`].
    pub async fn until_true<F, Fut>(&self, what: &str, mut probe: F) -> Result<(), WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        self.until(what, || {
            let fut = probe();
            async move {
                if fut.await? {
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("condition is false"))
                }
            }
        })
        .await
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod wait_tests;
