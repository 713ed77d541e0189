// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Eureka Control CLI
//!
//! Provisions consortia and waits on the components of a Eureka developer
//! environment.
//!
//! Commands:
//!   provision-consortium --name <consortium> --central <tenant>
//!   wait-kafka --suffix <suffix>... --tenant <tenant>
//!   wait-kong
//!   tenant-status --consortium-id <id> --tenant <tenant> --central <tenant>

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use eureka_core::auth::{ClientCredentials, fetch_access_token};
use eureka_core::probe::TenantStatusProbe;
use eureka_core::probe::kafka::wait_for_consumer_groups;
use eureka_core::probe::kong::wait_for_routes;
use eureka_core::{
    ConsortiumProvisioner, EurekaConfig, HttpExecutor, PollPolicy, ProvisionerSettings,
    TokioShell,
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Provision and wait on a Eureka developer environment.
#[derive(Debug, Parser)]
#[command(name = "eureka-ctl", version, about, long_about = None)]
struct Cli {
    /// Tenant registry JSON file.
    #[arg(long, global = true, env = "EUREKA_TENANTS_FILE")]
    tenants_file: Option<PathBuf>,

    /// Access token for tenant-scoped calls. Fetched from Keycloak when unset.
    #[arg(long, global = true, env = "EUREKA_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Environment name, prefix of consumer groups.
    #[arg(long, global = true, env = "EUREKA_ENV_NAME")]
    env_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a consortium and attach its registered tenants.
    ProvisionConsortium {
        /// Consortium name.
        #[arg(long)]
        name: String,

        /// Central tenant the calls are made as.
        #[arg(long)]
        central: String,

        #[command(flatten)]
        keycloak: KeycloakArgs,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait until consumer groups have no lag for a tenant.
    WaitKafka {
        /// Consumer group suffix, e.g. `mod-users-group`. Repeatable.
        #[arg(long = "suffix", required = true)]
        suffixes: Vec<String>,

        /// Tenant whose topics are checked.
        #[arg(long)]
        tenant: String,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Wait until the gateway exposes every management route.
    WaitKong {
        #[command(flatten)]
        poll: PollArgs,
    },

    /// Show the setup status of a consortium tenant.
    TenantStatus {
        #[arg(long)]
        consortium_id: String,

        #[arg(long)]
        tenant: String,

        /// Central tenant the call is made as.
        #[arg(long)]
        central: String,

        #[command(flatten)]
        keycloak: KeycloakArgs,
    },
}

/// Client credentials used when no access token is given.
#[derive(Debug, Args)]
struct KeycloakArgs {
    #[arg(long, env = "EUREKA_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "EUREKA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,
}

#[derive(Debug, Args)]
struct PollArgs {
    /// Maximum probe attempts (0 uses the default).
    #[arg(long, default_value_t = 0)]
    max_attempts: u32,

    /// Seconds between attempts.
    #[arg(long, default_value_t = 10)]
    interval_secs: u64,
}

impl PollArgs {
    fn policy(&self) -> PollPolicy {
        PollPolicy::new(self.max_attempts, Duration::from_secs(self.interval_secs))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eureka_ctl=info,eureka_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let cli = Cli::parse();

    let mut config = match EurekaConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = &cli.tenants_file {
        config = config.with_tenants_file(path);
    }
    if let Some(name) = &cli.env_name {
        config = config.with_env_name(name);
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            trigger.cancel();
        }
    });

    match execute_command(&config, cli, &cancel).await {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute_command(
    config: &EurekaConfig,
    cli: Cli,
    cancel: &CancellationToken,
) -> eureka_core::Result<serde_json::Value> {
    let http = HttpExecutor::from_config(&config.http)?.with_cancellation(cancel.clone());

    match cli.command {
        Command::ProvisionConsortium {
            name,
            central,
            keycloak,
            poll,
        } => {
            let token =
                resolve_token(&http, config, cli.token.as_deref(), &central, &keycloak).await?;
            let settings = ProvisionerSettings {
                gateway_url: config.gateway_url.clone(),
                admin_username: config.admin_username.clone(),
                status_policy: poll
                    .policy()
                    .with_defaults(&ProvisionerSettings::default().status_policy),
            };

            let report = ConsortiumProvisioner::new(http, settings, config.load_tenants()?, token)
                .with_cancellation(cancel.clone())
                .ensure_consortium_provisioned(&name, &central)
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        Command::WaitKafka {
            suffixes,
            tenant,
            poll,
        } => {
            let reports = wait_for_consumer_groups(
                Arc::new(TokioShell),
                &config.kafka,
                &config.env_name,
                &suffixes,
                &tenant,
                &poll.policy(),
                cancel,
            )
            .await?;
            Ok(serde_json::to_value(reports)?)
        }
        Command::WaitKong { poll } => {
            let ready = wait_for_routes(http, &config.kong_admin_url, &poll.policy(), cancel).await?;
            Ok(json!({
                "routes": ready.value,
                "attempts": ready.attempts,
            }))
        }
        Command::TenantStatus {
            consortium_id,
            tenant,
            central,
            keycloak,
        } => {
            let token =
                resolve_token(&http, config, cli.token.as_deref(), &central, &keycloak).await?;
            let probe = TenantStatusProbe::new(
                http,
                &config.gateway_url,
                &consortium_id,
                &tenant,
                &central,
                &token,
            )?;
            let status = probe.fetch_status().await?;
            Ok(json!({
                "consortium_id": consortium_id,
                "tenant": tenant,
                "setup_status": status,
                "terminal": status.is_terminal(),
            }))
        }
    }
}

/// Use the given token, or fetch one from the central tenant's realm.
async fn resolve_token(
    http: &HttpExecutor,
    config: &EurekaConfig,
    token: Option<&str>,
    central: &str,
    keycloak: &KeycloakArgs,
) -> eureka_core::Result<String> {
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        return Ok(token.to_string());
    }

    let (Some(client_id), Some(client_secret)) = (&keycloak.client_id, &keycloak.client_secret)
    else {
        return Err(eureka_core::Error::Config(
            "no access token given and no client credentials to fetch one \
             (set EUREKA_ACCESS_TOKEN or EUREKA_CLIENT_ID and EUREKA_CLIENT_SECRET)"
                .to_string(),
        ));
    };

    info!(realm = %central, "Fetching access token");
    let credentials = ClientCredentials {
        realm: central.to_string(),
        client_id: client_id.clone(),
        client_secret: client_secret.clone(),
    };
    fetch_access_token(http, &config.keycloak_url, &credentials).await
}
