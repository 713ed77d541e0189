// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Eureka Core
//!
//! Convergence polling and consortium provisioning for Eureka developer
//! environments.
//!
//! # Architecture
//!
//! - [`probe`]: single-shot checks of external state (Kafka consumer lag,
//!   Kong routes, consortium tenant setup status)
//! - [`poller`]: bounded, cancellable retry loop around a probe
//! - [`consortium`]: idempotent consortium and tenant provisioning
//! - [`http`] / [`shell`]: capability traits the above run on, with test
//!   doubles
//!
//! # Example
//!
//! ```no_run
//! use eureka_core::{EurekaConfig, HttpExecutor, PollPolicy};
//! use eureka_core::probe::kong::wait_for_routes;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EurekaConfig::from_env()?;
//! let http = HttpExecutor::from_config(&config.http)?;
//!
//! let ready = wait_for_routes(
//!     http,
//!     &config.kong_admin_url,
//!     &PollPolicy::default(),
//!     &CancellationToken::new(),
//! )
//! .await?;
//! println!("{} routes after {} attempts", ready.value, ready.attempts);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod consortium;
mod error;
pub mod http;
pub mod poller;
pub mod probe;
pub mod shell;
pub mod types;

pub use config::{EurekaConfig, TenantProfile, TenantRegistry};
pub use consortium::{
    ConsortiumProvisioner, ProvisionerSettings, ProvisioningEvent, ProvisioningReport,
    sort_tenants,
};
pub use error::{Error, Result};
pub use http::{HttpConfig, HttpExecutor};
pub use poller::{Converged, PollError, PollPolicy, poll};
pub use probe::{Probe, ProbeResult, Retry, RetryKind};
pub use shell::{ShellExecutor, ShellOutput, TokioShell};
pub use types::{ConsortiumTenant, TenantProvisioningStatus};
