// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scripted shell for testing.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ShellExecutor, ShellOutput};

/// A scripted command result.
#[derive(Debug, Clone)]
pub enum ScriptedRun {
    Output(ShellOutput),
    /// The process failed to launch.
    LaunchError(String),
}

/// Shell that replays scripted results in order and records each argv.
///
/// Once the script runs out the last result repeats.
#[derive(Debug, Clone, Default)]
pub struct ScriptedShell {
    script: Arc<Mutex<VecDeque<ScriptedRun>>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedShell {
    pub fn new(script: Vec<ScriptedRun>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script a sequence of command outputs.
    pub fn outputs(outputs: Vec<ShellOutput>) -> Self {
        Self::new(outputs.into_iter().map(ScriptedRun::Output).collect())
    }

    /// Every argv run so far.
    pub async fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ShellExecutor for ScriptedShell {
    async fn run(&self, argv: &[String]) -> std::io::Result<ShellOutput> {
        self.calls.lock().await.push(argv.to_vec());

        let mut script = self.script.lock().await;
        let next = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };

        match next {
            Some(ScriptedRun::Output(output)) => Ok(output),
            Some(ScriptedRun::LaunchError(message)) => {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, message))
            }
            None => Ok(ShellOutput::ok("")),
        }
    }
}
