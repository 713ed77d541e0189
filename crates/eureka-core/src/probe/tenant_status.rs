// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Consortium tenant setup status probe.

use async_trait::async_trait;

use super::{Probe, ProbeResult};
use crate::error::{Error, Result};
use crate::http::{HttpExecutor, okapi_headers};
use crate::types::{TenantDetails, TenantProvisioningStatus};

/// Probe converging when a consortium tenant's setup has completed.
pub struct TenantStatusProbe {
    http: HttpExecutor,
    url: String,
    tenant: String,
    headers: Vec<(String, String)>,
}

impl TenantStatusProbe {
    /// Probe `tenant` in `consortium_id`, calling as `central_tenant`.
    pub fn new(
        http: HttpExecutor,
        gateway_url: &str,
        consortium_id: &str,
        tenant: &str,
        central_tenant: &str,
        access_token: &str,
    ) -> Result<Self> {
        if tenant.trim().is_empty() {
            return Err(Error::InvalidInput("tenant name is blank".to_string()));
        }
        let headers = okapi_headers(central_tenant, access_token)?;

        Ok(Self {
            http,
            url: format!(
                "{}/consortia/{}/tenants/{}",
                gateway_url.trim_end_matches('/'),
                consortium_id,
                tenant
            ),
            tenant: tenant.to_string(),
            headers,
        })
    }

    /// Fetch the current setup status once.
    pub async fn fetch_status(&self) -> Result<TenantProvisioningStatus> {
        let details: TenantDetails = self.http.get_json(&self.url, &self.headers).await?;
        Ok(details.setup_status)
    }
}

#[async_trait]
impl Probe for TenantStatusProbe {
    type Output = TenantProvisioningStatus;

    fn target(&self) -> String {
        format!("tenant {} setup", self.tenant)
    }

    async fn probe(&mut self) -> ProbeResult<TenantProvisioningStatus> {
        match self.fetch_status().await {
            Ok(TenantProvisioningStatus::InProgress) => {
                ProbeResult::pending(format!("tenant {} setup in progress", self.tenant))
            }
            Ok(TenantProvisioningStatus::Completed) => {
                ProbeResult::Converged(TenantProvisioningStatus::Completed)
            }
            Ok(status) => ProbeResult::Fatal(Error::TenantSetupFailed {
                tenant: self.tenant.clone(),
                status,
            }),
            Err(e) => ProbeResult::Fatal(e),
        }
    }
}
