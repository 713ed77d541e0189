// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kafka consumer-group lag probe.
//!
//! Runs `kafka-consumer-groups.sh --describe` inside the broker container and
//! sums the LAG column of the rows that belong to one tenant.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::{Probe, ProbeResult};
use crate::error::{Error, Result};
use crate::poller::{self, Converged, PollPolicy};
use crate::shell::ShellExecutor;

/// Where and how to run the consumer-group tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    /// Container running the broker.
    pub container: String,
    /// Bootstrap server as seen from inside the container.
    pub bootstrap_server: String,
    /// Consumer-group tool inside the container.
    pub command: String,
    /// Wait after a broker `TimeoutException`.
    pub timeout_interval: Duration,
}

impl Default for KafkaSettings {
    fn default() -> Self {
        Self {
            container: "kafka".to_string(),
            bootstrap_server: "kafka:9092".to_string(),
            command: "kafka-consumer-groups.sh".to_string(),
            timeout_interval: Duration::from_secs(30),
        }
    }
}

impl KafkaSettings {
    /// Argv describing one consumer group.
    pub fn describe_argv(&self, group: &str) -> Vec<String> {
        vec![
            "docker".to_string(),
            "exec".to_string(),
            self.container.clone(),
            self.command.clone(),
            "--bootstrap-server".to_string(),
            self.bootstrap_server.clone(),
            "--describe".to_string(),
            "--group".to_string(),
            group.to_string(),
        ]
    }
}

/// Consumer group name for an environment, e.g. `eureka-mod-users-group`.
pub fn consumer_group(env_name: &str, suffix: &str) -> String {
    format!("{}-{}", env_name, suffix)
}

/// Lag summed over a tenant's partitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerLag {
    pub lag: u64,
    /// Rows whose LAG cell was not a number (typically `-` before the first
    /// commit). They count as zero.
    pub unparsed_rows: Vec<String>,
}

/// Sum the LAG column of `kafka-consumer-groups.sh --describe` output for
/// rows whose topic belongs to `tenant`.
///
/// Topics are named `<env>.<tenant>.<...>`, so a row matches when its TOPIC
/// column contains `.<tenant>.`.
pub fn parse_consumer_lag(stdout: &str, tenant: &str) -> ConsumerLag {
    let marker = format!(".{}.", tenant);
    let mut result = ConsumerLag::default();

    for line in stdout.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 6 || columns[0] == "GROUP" {
            continue;
        }
        if !columns[1].contains(&marker) {
            continue;
        }
        match columns[5].parse::<u64>() {
            Ok(lag) => result.lag += lag,
            Err(_) => result.unparsed_rows.push(line.trim().to_string()),
        }
    }

    result
}

/// Probe converging when a tenant's consumer-group lag reaches zero.
pub struct KafkaLagProbe {
    shell: Arc<dyn ShellExecutor>,
    argv: Vec<String>,
    group: String,
    tenant: String,
    timeout_interval: Duration,
    last_lag: Option<ConsumerLag>,
}

impl KafkaLagProbe {
    /// Create a probe for `<env_name>-<suffix>` filtered to `tenant`.
    pub fn new(
        shell: Arc<dyn ShellExecutor>,
        settings: &KafkaSettings,
        env_name: &str,
        suffix: &str,
        tenant: &str,
    ) -> Result<Self> {
        if env_name.trim().is_empty() || suffix.trim().is_empty() {
            return Err(Error::InvalidInput(
                "consumer group needs an environment name and a suffix".to_string(),
            ));
        }
        if tenant.trim().is_empty() {
            return Err(Error::InvalidInput("tenant name is blank".to_string()));
        }

        let group = consumer_group(env_name, suffix);
        Ok(Self {
            shell,
            argv: settings.describe_argv(&group),
            group,
            tenant: tenant.to_string(),
            timeout_interval: settings.timeout_interval,
            last_lag: None,
        })
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Most recent successful reading. Unchanged by rebalancing or timeout
    /// results.
    pub fn last_lag(&self) -> Option<&ConsumerLag> {
        self.last_lag.as_ref()
    }
}

#[async_trait]
impl Probe for KafkaLagProbe {
    type Output = ConsumerLag;

    fn target(&self) -> String {
        self.group.clone()
    }

    async fn probe(&mut self) -> ProbeResult<ConsumerLag> {
        let output = match self.shell.run(&self.argv).await {
            Ok(output) => output,
            Err(e) => return ProbeResult::Fatal(Error::Io(e)),
        };

        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            let lowered = stderr.to_ascii_lowercase();
            if lowered.contains("no active members") || lowered.contains("rebalancing") {
                return ProbeResult::rebalancing(stderr);
            }
            if stderr.contains("TimeoutException") {
                return ProbeResult::backoff(stderr, self.timeout_interval);
            }
            return ProbeResult::Fatal(Error::Command {
                program: self.argv.join(" "),
                message: stderr.to_string(),
            });
        }
        if !output.success() {
            return ProbeResult::Fatal(Error::Command {
                program: self.argv.join(" "),
                message: format!("exited with status {:?}", output.status),
            });
        }

        let lag = parse_consumer_lag(&output.stdout, &self.tenant);
        if !lag.unparsed_rows.is_empty() {
            warn!(
                group = %self.group,
                tenant = %self.tenant,
                rows = lag.unparsed_rows.len(),
                "Unparsable lag values counted as zero"
            );
        }
        self.last_lag = Some(lag.clone());

        if lag.lag == 0 {
            ProbeResult::Converged(lag)
        } else {
            ProbeResult::pending(format!("consumer lag is {}", lag.lag))
        }
    }
}

/// Outcome of waiting on one consumer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerGroupReport {
    pub group: String,
    pub tenant: String,
    pub attempts: u32,
    pub unparsed_rows: Vec<String>,
}

/// Wait until `<env_name>-<suffix>` has no lag for `tenant`.
#[instrument(skip(shell, settings, policy, cancel))]
pub async fn wait_for_consumer_group(
    shell: Arc<dyn ShellExecutor>,
    settings: &KafkaSettings,
    env_name: &str,
    suffix: &str,
    tenant: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<ConsumerGroupReport> {
    let mut probe = KafkaLagProbe::new(shell, settings, env_name, suffix, tenant)?;
    let Converged { value, attempts } = poller::poll(&mut probe, policy, cancel).await?;

    info!(group = %probe.group(), attempts, "Consumer group caught up");

    Ok(ConsumerGroupReport {
        group: probe.group().to_string(),
        tenant: tenant.to_string(),
        attempts,
        unparsed_rows: value.unparsed_rows,
    })
}

/// Wait on several consumer groups one after another.
pub async fn wait_for_consumer_groups(
    shell: Arc<dyn ShellExecutor>,
    settings: &KafkaSettings,
    env_name: &str,
    suffixes: &[String],
    tenant: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Vec<ConsumerGroupReport>> {
    let mut reports = Vec::with_capacity(suffixes.len());
    for suffix in suffixes {
        let report = wait_for_consumer_group(
            shell.clone(),
            settings,
            env_name,
            suffix,
            tenant,
            policy,
            cancel,
        )
        .await?;
        reports.push(report);
    }
    Ok(reports)
}
