// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Domain types and the wire records exchanged with Kong, Keycloak and
//! mod-consortia.
//!
//! Field names of the wire records follow the backend JSON exactly.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tenant that belongs to a consortium.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsortiumTenant {
    /// Tenant name, also used as its id in mod-consortia.
    pub name: String,
    /// Whether this tenant is the consortium hub.
    pub is_central: bool,
}

impl ConsortiumTenant {
    /// Create a central (hub) tenant.
    pub fn central(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_central: true,
        }
    }

    /// Create a member tenant.
    pub fn member(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_central: false,
        }
    }

    /// Short tenant code required by mod-consortia.
    ///
    /// First three alphanumeric characters of the name, upper-cased.
    pub fn code(&self) -> String {
        self.name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_ascii_uppercase()
    }
}

/// Setup status reported by mod-consortia for a consortium tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenantProvisioningStatus {
    /// Setup is still running.
    InProgress,
    /// Setup failed.
    Failed,
    /// Setup finished successfully.
    Completed,
    /// Setup finished but some steps failed.
    CompletedWithErrors,
}

impl TenantProvisioningStatus {
    /// Check if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TenantProvisioningStatus::InProgress)
    }

    /// Check if this is the only successful terminal status.
    pub fn is_success(&self) -> bool {
        matches!(self, TenantProvisioningStatus::Completed)
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantProvisioningStatus::InProgress => "IN_PROGRESS",
            TenantProvisioningStatus::Failed => "FAILED",
            TenantProvisioningStatus::Completed => "COMPLETED",
            TenantProvisioningStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
        }
    }
}

impl fmt::Display for TenantProvisioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// mod-consortia
// ============================================================================

/// A consortium as returned by `GET /consortia`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consortium {
    pub id: String,
    pub name: String,
}

/// Response of `GET /consortia`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsortiumCollection {
    #[serde(default)]
    pub consortia: Vec<Consortium>,
    #[serde(default)]
    pub total_records: u64,
}

/// A tenant attached to a consortium, as sent to and returned by
/// `/consortia/{id}/tenants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsortiumTenantRecord {
    pub id: String,
    /// Optional on read, always sent on create.
    #[serde(default)]
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub is_central: bool,
}

impl From<&ConsortiumTenant> for ConsortiumTenantRecord {
    fn from(tenant: &ConsortiumTenant) -> Self {
        Self {
            id: tenant.name.clone(),
            code: tenant.code(),
            name: tenant.name.clone(),
            is_central: tenant.is_central,
        }
    }
}

/// Response of `GET /consortia/{id}/tenants`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsortiumTenantCollection {
    #[serde(default)]
    pub tenants: Vec<ConsortiumTenantRecord>,
    #[serde(default)]
    pub total_records: u64,
}

/// Response of `GET /consortia/{id}/tenants/{tenantId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDetails {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub setup_status: TenantProvisioningStatus,
    #[serde(default)]
    pub is_central: bool,
}

// ============================================================================
// mod-users
// ============================================================================

/// A user record, reduced to the fields needed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// Response of `GET /users`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCollection {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub total_records: u64,
}

// ============================================================================
// Kong admin API
// ============================================================================

/// A Kong route, reduced to the fields needed for readiness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Expression router match, e.g. `(http.path == "/tenants" && http.method == "GET")`.
    #[serde(default)]
    pub expression: Option<String>,
}

/// One page of `GET /routes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteCollection {
    #[serde(default)]
    pub data: Vec<Route>,
    /// Relative link to the next page, `null` on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

// ============================================================================
// Keycloak
// ============================================================================

/// OpenID Connect token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}
