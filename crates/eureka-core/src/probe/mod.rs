// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Outcome probes.
//!
//! A probe performs one check against an external system and classifies the
//! answer as converged, worth retrying, or fatal. The
//! [`poller`](crate::poller) decides how often to ask.

pub mod kafka;
pub mod kong;
pub mod tenant_status;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

pub use kafka::{ConsumerLag, KafkaLagProbe, KafkaSettings};
pub use kong::{KongRoutesProbe, REQUIRED_ROUTE_EXPRESSIONS};
pub use tenant_status::TenantStatusProbe;

/// How a retryable result is paced and budgeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryKind {
    /// Target not reached yet. Waits the policy interval and clears the
    /// rebalance counter.
    Pending,
    /// Consumer group is rebalancing. Counts against the rebalance budget and
    /// waits the rebalance interval.
    Rebalancing,
    /// Waits the given duration without touching the rebalance counter.
    Backoff(Duration),
}

/// A retryable probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retry {
    pub kind: RetryKind,
    pub reason: String,
}

/// Result of a single probe attempt.
#[derive(Debug)]
pub enum ProbeResult<T> {
    /// The condition holds.
    Converged(T),
    /// The condition does not hold yet.
    Retryable(Retry),
    /// The condition can never hold; stop polling.
    Fatal(Error),
}

impl<T> ProbeResult<T> {
    pub fn pending(reason: impl Into<String>) -> Self {
        ProbeResult::Retryable(Retry {
            kind: RetryKind::Pending,
            reason: reason.into(),
        })
    }

    pub fn rebalancing(reason: impl Into<String>) -> Self {
        ProbeResult::Retryable(Retry {
            kind: RetryKind::Rebalancing,
            reason: reason.into(),
        })
    }

    pub fn backoff(reason: impl Into<String>, wait: Duration) -> Self {
        ProbeResult::Retryable(Retry {
            kind: RetryKind::Backoff(wait),
            reason: reason.into(),
        })
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, ProbeResult::Converged(_))
    }
}

/// A single-shot check of an external condition.
#[async_trait]
pub trait Probe: Send {
    /// Value produced once the condition holds.
    type Output: Send;

    /// Name of what is being waited on, used in errors and logs.
    fn target(&self) -> String;

    /// Check the condition once.
    async fn probe(&mut self) -> ProbeResult<Self::Output>;
}
