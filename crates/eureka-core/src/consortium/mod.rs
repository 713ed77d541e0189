// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Consortium provisioning.
//!
//! A consortium groups tenants around one central (hub) tenant. Member
//! tenants are attached through the central tenant's admin user, so the
//! central tenant always has to exist first.

mod client;
mod sequencer;

use serde::Serialize;

pub use client::ConsortiumClient;
pub use sequencer::{ConsortiumProvisioner, ProvisionerSettings};

use crate::types::ConsortiumTenant;

/// Order tenants central-first.
///
/// Every central tenant ends up before every member tenant. The order within
/// each group is preserved.
pub fn sort_tenants(mut tenants: Vec<ConsortiumTenant>) -> Vec<ConsortiumTenant> {
    tenants.sort_by_key(|tenant| !tenant.is_central);
    tenants
}

/// One step the sequencer took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProvisioningEvent {
    /// The consortium already existed.
    ConsortiumFound { id: String },
    /// The consortium was created.
    ConsortiumCreated { id: String },
    /// The tenant was already attached to the consortium.
    TenantSkipped { tenant: String },
    /// The tenant was attached and its setup completed.
    TenantCreated {
        tenant: String,
        central: bool,
        /// Status polls until setup completed.
        attempts: u32,
    },
}

/// What [`ConsortiumProvisioner::ensure_consortium_provisioned`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisioningReport {
    pub consortium_id: String,
    pub consortium_name: String,
    pub events: Vec<ProvisioningEvent>,
}

impl ProvisioningReport {
    /// Tenants created during this run, in creation order.
    pub fn created_tenants(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProvisioningEvent::TenantCreated { tenant, .. } => Some(tenant.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Whether this run changed anything.
    pub fn made_changes(&self) -> bool {
        self.events.iter().any(|event| {
            matches!(
                event,
                ProvisioningEvent::ConsortiumCreated { .. } | ProvisioningEvent::TenantCreated { .. }
            )
        })
    }
}
