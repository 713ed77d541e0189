// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! mod-consortia and mod-users calls used by the sequencer.

use serde_json::json;
use tracing::debug;

use crate::error::Result;
use crate::http::HttpExecutor;
use crate::types::{
    Consortium, ConsortiumCollection, ConsortiumTenant, ConsortiumTenantCollection,
    ConsortiumTenantRecord, UserCollection,
};

/// Page size for collection reads. The modules default to 10 records.
pub const PAGE_LIMIT: u32 = 1000;

/// Thin client for the consortium endpoints behind the gateway.
#[derive(Debug, Clone)]
pub struct ConsortiumClient {
    http: HttpExecutor,
    gateway_url: String,
}

impl ConsortiumClient {
    pub fn new(http: HttpExecutor, gateway_url: &str) -> Self {
        Self {
            http,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http(&self) -> &HttpExecutor {
        &self.http
    }

    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Look up a consortium by name.
    pub async fn find_consortium(
        &self,
        headers: &[(String, String)],
        name: &str,
    ) -> Result<Option<Consortium>> {
        let url = format!("{}/consortia?limit={}", self.gateway_url, PAGE_LIMIT);
        let collection: ConsortiumCollection = self.http.get_json(&url, headers).await?;
        Ok(collection.consortia.into_iter().find(|c| c.name == name))
    }

    /// Create a consortium with a caller-chosen id.
    pub async fn create_consortium(
        &self,
        headers: &[(String, String)],
        id: &str,
        name: &str,
    ) -> Result<()> {
        let url = format!("{}/consortia", self.gateway_url);
        self.http
            .post_json(&url, headers, &json!({ "id": id, "name": name }))
            .await?;
        debug!(consortium_id = %id, consortium = %name, "Created consortium");
        Ok(())
    }

    /// Tenants already attached to a consortium.
    pub async fn list_tenants(
        &self,
        headers: &[(String, String)],
        consortium_id: &str,
    ) -> Result<Vec<ConsortiumTenantRecord>> {
        let url = format!(
            "{}/consortia/{}/tenants?limit={}",
            self.gateway_url, consortium_id, PAGE_LIMIT
        );
        let collection: ConsortiumTenantCollection = self.http.get_json(&url, headers).await?;
        Ok(collection.tenants)
    }

    /// Attach a tenant to a consortium.
    ///
    /// Member tenants need the id of the central tenant's admin user.
    pub async fn create_tenant(
        &self,
        headers: &[(String, String)],
        consortium_id: &str,
        tenant: &ConsortiumTenant,
        admin_user_id: Option<&str>,
    ) -> Result<()> {
        let mut url = format!("{}/consortia/{}/tenants", self.gateway_url, consortium_id);
        if let Some(user_id) = admin_user_id {
            url = format!("{}?adminUserId={}", url, urlencoding::encode(user_id));
        }

        let record = ConsortiumTenantRecord::from(tenant);
        self.http.post_json(&url, headers, &record).await?;
        debug!(
            consortium_id = %consortium_id,
            tenant = %tenant.name,
            central = tenant.is_central,
            "Submitted consortium tenant"
        );
        Ok(())
    }

    /// Id of the user with the given username, searched in the tenant the
    /// headers point at.
    pub async fn find_user_id(
        &self,
        headers: &[(String, String)],
        username: &str,
    ) -> Result<Option<String>> {
        let query = format!("username=={}", username);
        let url = format!(
            "{}/users?query={}&limit=1",
            self.gateway_url,
            urlencoding::encode(&query)
        );
        let collection: UserCollection = self.http.get_json(&url, headers).await?;
        Ok(collection.users.into_iter().next().map(|user| user.id))
    }
}
