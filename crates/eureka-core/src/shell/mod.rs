// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shell command capability.
//!
//! Commands are passed as argv, never through a shell, and are not retried.

pub mod mock;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

pub use mock::ScriptedShell;

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    /// Output of a command that exited cleanly.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a command that wrote to stderr.
    pub fn with_stderr(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(1),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external commands.
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Run `argv[0]` with the remaining arguments and wait for it.
    ///
    /// An `Err` means the process could not be run at all. A process that
    /// ran and failed is reported through [`ShellOutput`].
    async fn run(&self, argv: &[String]) -> std::io::Result<ShellOutput>;
}

/// Runs commands with `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioShell;

impl TokioShell {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShellExecutor for TokioShell {
    async fn run(&self, argv: &[String]) -> std::io::Result<ShellOutput> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command")
        })?;

        debug!(program = %program, args = ?args, "Running command");

        let output = Command::new(program).args(args).output().await?;

        Ok(ShellOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
