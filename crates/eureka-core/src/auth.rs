// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Keycloak access tokens.
//!
//! Each tenant is a Keycloak realm. Provisioning calls are made with a
//! client-credentials token from the central tenant's realm.

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::http::HttpExecutor;
use crate::types::TokenResponse;

/// Client credentials for one realm.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub realm: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Fetch an access token with the client-credentials grant.
#[instrument(skip(http, credentials), fields(realm = %credentials.realm, client_id = %credentials.client_id))]
pub async fn fetch_access_token(
    http: &HttpExecutor,
    keycloak_url: &str,
    credentials: &ClientCredentials,
) -> Result<String> {
    if credentials.realm.trim().is_empty() || credentials.client_id.trim().is_empty() {
        return Err(Error::InvalidInput(
            "realm and client id are required to fetch a token".to_string(),
        ));
    }

    let url = format!(
        "{}/realms/{}/protocol/openid-connect/token",
        keycloak_url.trim_end_matches('/'),
        credentials.realm
    );
    let token: TokenResponse = http
        .post_form(
            &url,
            vec![
                ("grant_type".to_string(), "client_credentials".to_string()),
                ("client_id".to_string(), credentials.client_id.clone()),
                ("client_secret".to_string(), credentials.client_secret.clone()),
            ],
        )
        .await?;

    if token.access_token.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "Keycloak returned an empty access token for realm {}",
            credentials.realm
        )));
    }

    debug!(expires_in = token.expires_in, "Fetched access token");
    Ok(token.access_token)
}
