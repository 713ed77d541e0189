// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bounded convergence polling.
//!
//! [`poll`] calls a [`Probe`] until it converges, fails fatally, or the
//! attempt budget runs out. Two budgets exist:
//!
//! - the main budget, one unit per probe call;
//! - the rebalance budget, one unit per consecutive
//!   [`RetryKind::Rebalancing`] result, cleared by any
//!   [`RetryKind::Pending`] or converged result.
//!
//! Sleeps between attempts race against a [`CancellationToken`].

use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Error;
use crate::probe::{Probe, ProbeResult, RetryKind};

/// Main attempt budget when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
/// Wait between pending attempts when none is configured.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);
/// Rebalance budget when none is configured.
pub const DEFAULT_REBALANCE_MAX_ATTEMPTS: u32 = 10;
/// Wait after a rebalancing result when none is configured.
pub const DEFAULT_REBALANCE_INTERVAL: Duration = Duration::from_secs(15);

/// Attempt budgets and pacing for one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum probe calls. Zero means "use the default".
    pub max_attempts: u32,
    /// Wait after a pending result.
    pub interval: Duration,
    /// Maximum consecutive rebalancing results. Zero means "use the default".
    pub rebalance_max_attempts: u32,
    /// Wait after a rebalancing result.
    pub rebalance_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
            rebalance_max_attempts: DEFAULT_REBALANCE_MAX_ATTEMPTS,
            rebalance_interval: DEFAULT_REBALANCE_INTERVAL,
        }
    }
}

impl PollPolicy {
    /// Policy with the given main budget and interval, defaults elsewhere.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            ..Self::default()
        }
    }

    /// Set the rebalance budget and its wait.
    pub fn with_rebalance(mut self, max_attempts: u32, interval: Duration) -> Self {
        self.rebalance_max_attempts = max_attempts;
        self.rebalance_interval = interval;
        self
    }

    /// Replace zero attempt budgets with those of `defaults`.
    ///
    /// Intervals are kept as given since a zero wait is legitimate.
    pub fn with_defaults(mut self, defaults: &PollPolicy) -> Self {
        if self.max_attempts == 0 {
            self.max_attempts = defaults.max_attempts;
        }
        if self.rebalance_max_attempts == 0 {
            self.rebalance_max_attempts = defaults.rebalance_max_attempts;
        }
        self.max_attempts = self.max_attempts.max(1);
        self.rebalance_max_attempts = self.rebalance_max_attempts.max(1);
        self
    }
}

/// Value produced by a converged poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converged<T> {
    pub value: T,
    /// Probe calls used, including the converging one.
    pub attempts: u32,
}

/// Why a poll did not converge.
#[derive(Debug, Error)]
pub enum PollError {
    /// Main budget exhausted.
    #[error("timed out waiting for {target} after {attempts} attempts")]
    Timeout { target: String, attempts: u32 },

    /// Rebalance budget exhausted.
    #[error("consumer group {target} was still rebalancing after {attempts} attempts")]
    RebalanceTimeout { target: String, attempts: u32 },

    /// Cancellation token fired.
    #[error("waiting for {target} was cancelled")]
    Cancelled { target: String },

    /// The probe reported a fatal error.
    #[error(transparent)]
    Fatal(Box<Error>),
}

/// Poll `probe` until it converges.
///
/// Returns as soon as the probe converges or reports a fatal error. A probe
/// that keeps asking for retries is called exactly `max_attempts` times and
/// there is no sleep after the final call.
pub async fn poll<P>(
    probe: &mut P,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Converged<P::Output>, PollError>
where
    P: Probe + ?Sized,
{
    let policy = policy.clone().with_defaults(&PollPolicy::default());
    let target = probe.target();
    let mut rebalance_failures: u32 = 0;

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(PollError::Cancelled { target });
        }

        let (wait, reason) = match probe.probe().await {
            ProbeResult::Converged(value) => {
                info!(probe = %target, attempt, "Converged");
                return Ok(Converged {
                    value,
                    attempts: attempt,
                });
            }
            ProbeResult::Fatal(err) => {
                return Err(PollError::Fatal(Box::new(err)));
            }
            ProbeResult::Retryable(retry) => match retry.kind {
                RetryKind::Pending => {
                    rebalance_failures = 0;
                    (policy.interval, retry.reason)
                }
                RetryKind::Rebalancing => {
                    rebalance_failures += 1;
                    if rebalance_failures >= policy.rebalance_max_attempts {
                        return Err(PollError::RebalanceTimeout {
                            target,
                            attempts: rebalance_failures,
                        });
                    }
                    (policy.rebalance_interval, retry.reason)
                }
                RetryKind::Backoff(wait) => (wait, retry.reason),
            },
        };

        debug!(
            probe = %target,
            attempt,
            max_attempts = policy.max_attempts,
            rebalance_failures,
            wait_ms = wait.as_millis() as u64,
            reason = %reason,
            "Not converged yet"
        );

        if attempt < policy.max_attempts && !sleep_or_cancel(wait, cancel).await {
            return Err(PollError::Cancelled { target });
        }
    }

    Err(PollError::Timeout {
        target,
        attempts: policy.max_attempts,
    })
}

/// Sleep unless cancelled first. Returns `false` on cancellation.
pub(crate) async fn sleep_or_cancel(wait: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(wait) => true,
    }
}
