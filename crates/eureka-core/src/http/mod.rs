// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP capability: transport trait, retrying executor and test double.

mod executor;
pub mod mock;
mod transport;

pub use executor::{HttpConfig, HttpExecutor};
pub use mock::MockTransport;
pub use transport::{
    HttpBody, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
};

use crate::error::{Error, Result};

/// Tenant header understood by the gateway and the modules behind it.
pub const TENANT_HEADER: &str = "X-Okapi-Tenant";
/// Access token header understood by the gateway.
pub const TOKEN_HEADER: &str = "X-Okapi-Token";

/// Build the headers for a tenant-scoped call.
///
/// A blank tenant or token is rejected before any request is made.
pub fn okapi_headers(tenant: &str, access_token: &str) -> Result<Vec<(String, String)>> {
    if tenant.trim().is_empty() {
        return Err(Error::InvalidInput("tenant name is blank".to_string()));
    }
    if access_token.trim().is_empty() {
        return Err(Error::InvalidInput("access token is blank".to_string()));
    }

    Ok(vec![
        (TENANT_HEADER.to_string(), tenant.to_string()),
        (TOKEN_HEADER.to_string(), access_token.to_string()),
    ])
}
