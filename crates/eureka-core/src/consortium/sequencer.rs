// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Idempotent consortium provisioning sequence.
//!
//! 1. Find the consortium by name or create it with a fresh UUID.
//! 2. Take the consortium's tenants from the registry, central-first.
//! 3. Attach each missing tenant; members get the central admin user id.
//! 4. Poll each new tenant's setup status until it completes.
//!
//! Every write is preceded by an existence check, so re-running after a
//! partial failure picks up where the last run stopped. Nothing is rolled
//! back.

use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::client::ConsortiumClient;
use super::{ProvisioningEvent, ProvisioningReport, sort_tenants};
use crate::config::TenantRegistry;
use crate::error::{Error, Result};
use crate::http::{HttpExecutor, okapi_headers};
use crate::poller::{self, PollError, PollPolicy};
use crate::probe::TenantStatusProbe;

/// Settings for the provisioning sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerSettings {
    /// Kong gateway URL the platform APIs are served from.
    pub gateway_url: String,
    /// Username of the central tenant's admin user.
    pub admin_username: String,
    /// Budget for each tenant's setup-status poll.
    pub status_policy: PollPolicy,
}

impl Default for ProvisionerSettings {
    fn default() -> Self {
        Self {
            gateway_url: "http://localhost:8000".to_string(),
            admin_username: "admin".to_string(),
            status_policy: PollPolicy::new(60, Duration::from_secs(10)),
        }
    }
}

/// Creates a consortium and its tenants.
pub struct ConsortiumProvisioner {
    client: ConsortiumClient,
    registry: TenantRegistry,
    admin_username: String,
    status_policy: PollPolicy,
    access_token: String,
    cancel: CancellationToken,
}

impl ConsortiumProvisioner {
    pub fn new(
        http: HttpExecutor,
        settings: ProvisionerSettings,
        registry: TenantRegistry,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: ConsortiumClient::new(http, &settings.gateway_url),
            registry,
            admin_username: settings.admin_username,
            status_policy: settings.status_policy,
            access_token: access_token.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the sequence when `cancel` fires.
    ///
    /// Checked before every write and raced against status polls and HTTP
    /// retry waits.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        let http = self.client.http().clone().with_cancellation(cancel.clone());
        self.client = ConsortiumClient::new(http, self.client.gateway_url());
        self.cancel = cancel;
        self
    }

    /// Make sure `consortium_name` exists with all of its registered tenants.
    ///
    /// Requests are issued as `central_tenant`. Returns the consortium id and
    /// the steps taken; a second run against a complete consortium performs
    /// no writes.
    #[instrument(skip(self))]
    pub async fn ensure_consortium_provisioned(
        &self,
        consortium_name: &str,
        central_tenant: &str,
    ) -> Result<ProvisioningReport> {
        if consortium_name.trim().is_empty() {
            return Err(Error::InvalidInput("consortium name is blank".to_string()));
        }
        let headers = okapi_headers(central_tenant, &self.access_token)?;
        self.ensure_not_cancelled(consortium_name)?;
        let mut events = Vec::new();

        let consortium_id = match self.client.find_consortium(&headers, consortium_name).await? {
            Some(existing) => {
                info!(consortium_id = %existing.id, "Consortium already exists");
                events.push(ProvisioningEvent::ConsortiumFound {
                    id: existing.id.clone(),
                });
                existing.id
            }
            None => {
                self.ensure_not_cancelled(consortium_name)?;
                let id = Uuid::new_v4().to_string();
                self.client
                    .create_consortium(&headers, &id, consortium_name)
                    .await?;
                info!(consortium_id = %id, "Consortium created");
                events.push(ProvisioningEvent::ConsortiumCreated { id: id.clone() });
                id
            }
        };

        let tenants = sort_tenants(self.registry.consortium_tenants(consortium_name));
        if tenants.is_empty() {
            warn!("No tenants registered for consortium");
        }

        let existing: HashSet<String> = self
            .client
            .list_tenants(&headers, &consortium_id)
            .await?
            .into_iter()
            .flat_map(|record| [record.id, record.name])
            .collect();

        let mut admin_user_id: Option<String> = None;

        for tenant in &tenants {
            self.ensure_not_cancelled(&tenant.name)?;
            if existing.contains(&tenant.name) {
                info!(tenant = %tenant.name, "Tenant already in consortium");
                events.push(ProvisioningEvent::TenantSkipped {
                    tenant: tenant.name.clone(),
                });
                continue;
            }

            if tenant.is_central {
                self.client
                    .create_tenant(&headers, &consortium_id, tenant, None)
                    .await?;
            } else {
                let user_id = match &admin_user_id {
                    Some(id) => id.clone(),
                    None => {
                        let id = self.resolve_admin_user_id(&headers, central_tenant).await?;
                        admin_user_id = Some(id.clone());
                        id
                    }
                };
                self.client
                    .create_tenant(&headers, &consortium_id, tenant, Some(&user_id))
                    .await?;
            }

            let attempts = self
                .wait_for_tenant_setup(&consortium_id, &tenant.name, central_tenant)
                .await?;
            info!(tenant = %tenant.name, attempts, "Tenant setup completed");

            events.push(ProvisioningEvent::TenantCreated {
                tenant: tenant.name.clone(),
                central: tenant.is_central,
                attempts,
            });
        }

        Ok(ProvisioningReport {
            consortium_id,
            consortium_name: consortium_name.to_string(),
            events,
        })
    }

    fn ensure_not_cancelled(&self, target: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            warn!(step = %target, "Provisioning cancelled");
            return Err(Error::Poll(PollError::Cancelled {
                target: format!("provisioning of {}", target),
            }));
        }
        Ok(())
    }

    async fn resolve_admin_user_id(
        &self,
        headers: &[(String, String)],
        central_tenant: &str,
    ) -> Result<String> {
        self.client
            .find_user_id(headers, &self.admin_username)
            .await?
            .ok_or_else(|| Error::AdminUserNotFound {
                tenant: central_tenant.to_string(),
                username: self.admin_username.clone(),
            })
    }

    /// Poll a tenant's setup status until it completes. Returns the polls used.
    async fn wait_for_tenant_setup(
        &self,
        consortium_id: &str,
        tenant: &str,
        central_tenant: &str,
    ) -> Result<u32> {
        let mut probe = TenantStatusProbe::new(
            self.client.http().clone(),
            self.client.gateway_url(),
            consortium_id,
            tenant,
            central_tenant,
            &self.access_token,
        )?;
        let converged = poller::poll(&mut probe, &self.status_policy, &self.cancel).await?;
        Ok(converged.attempts)
    }
}
