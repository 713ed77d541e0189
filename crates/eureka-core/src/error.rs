// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for eureka-core.

use thiserror::Error;

use crate::poller::PollError;
use crate::types::TenantProvisioningStatus;

/// Result type using Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while provisioning or waiting on an environment.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input, such as a blank tenant name or access token.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Server answered with a status outside of 2xx.
    #[error("{method} {url} returned {status}: {body}")]
    Http {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// Request never produced a response (connect, timeout, broken pipe).
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A subprocess could not be launched or waited on.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A subprocess ran but reported an error we cannot recover from.
    #[error("command `{program}` failed: {message}")]
    Command { program: String, message: String },

    /// Consortium tenant setup ended in a failed state.
    #[error("tenant {tenant} setup finished with status {status}")]
    TenantSetupFailed {
        tenant: String,
        status: TenantProvisioningStatus,
    },

    /// The admin user needed to attach a member tenant does not exist.
    #[error("admin user {username} not found in tenant {tenant}")]
    AdminUserNotFound { tenant: String, username: String },

    /// Polling gave up (timeout, rebalance timeout or cancellation).
    #[error(transparent)]
    Poll(PollError),
}

impl Error {
    /// Whether a request that failed with this error is worth repeating.
    ///
    /// Covers transport failures and the 429/503 statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Http { status, .. } => matches!(status, 429 | 503),
            _ => false,
        }
    }
}

impl From<PollError> for Error {
    fn from(err: PollError) -> Self {
        match err {
            PollError::Fatal(inner) => *inner,
            other => Error::Poll(other),
        }
    }
}
