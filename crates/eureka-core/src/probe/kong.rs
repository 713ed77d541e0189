// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kong gateway readiness probe.
//!
//! The gateway is ready once every management route needed to register
//! applications, discover modules, create tenants and entitle them is
//! configured.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::{Probe, ProbeResult};
use crate::error::{Error, Result};
use crate::http::HttpExecutor;
use crate::poller::{self, Converged, PollPolicy};
use crate::types::RouteCollection;

/// Route expressions that must be present before the gateway is usable.
///
/// Compared verbatim with each route's `expression`.
pub const REQUIRED_ROUTE_EXPRESSIONS: [&str; 13] = [
    r#"(http.path == "/applications" && http.method == "GET")"#,
    r#"(http.path == "/applications" && http.method == "POST")"#,
    r#"(http.path ~ "^/applications/([^/]+)$" && http.method == "GET")"#,
    r#"(http.path ~ "^/applications/([^/]+)$" && http.method == "DELETE")"#,
    r#"(http.path == "/modules/discovery" && http.method == "GET")"#,
    r#"(http.path ~ "^/applications/([^/]+)/discovery$" && http.method == "POST")"#,
    r#"(http.path ~ "^/modules/([^/]+)/discovery$" && http.method == "PUT")"#,
    r#"(http.path == "/tenants" && http.method == "GET")"#,
    r#"(http.path == "/tenants" && http.method == "POST")"#,
    r#"(http.path ~ "^/tenants/([^/]+)$" && http.method == "DELETE")"#,
    r#"(http.path == "/entitlements" && http.method == "GET")"#,
    r#"(http.path == "/entitlements" && http.method == "POST")"#,
    r#"(http.path == "/entitlements" && http.method == "DELETE")"#,
];

/// Probe converging when all required routes are registered.
pub struct KongRoutesProbe {
    http: HttpExecutor,
    admin_url: String,
    required: HashSet<String>,
}

impl KongRoutesProbe {
    /// Probe for [`REQUIRED_ROUTE_EXPRESSIONS`].
    pub fn new(http: HttpExecutor, admin_url: &str) -> Self {
        Self::with_required(http, admin_url, REQUIRED_ROUTE_EXPRESSIONS.iter().copied())
    }

    /// Probe for a custom route set.
    pub fn with_required<'a>(
        http: HttpExecutor,
        admin_url: &str,
        required: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            http,
            admin_url: admin_url.trim_end_matches('/').to_string(),
            required: required.into_iter().map(str::to_string).collect(),
        }
    }

    /// Number of distinct required expressions currently routed.
    pub async fn count_required_routes(&self) -> Result<usize> {
        let mut present: HashSet<String> = HashSet::new();
        let mut next = Some("/routes".to_string());

        while let Some(path) = next {
            let url = format!("{}{}", self.admin_url, path);
            let page: RouteCollection = self.http.get_json(&url, &[]).await?;
            debug!(url = %url, routes = page.data.len(), "Fetched route page");

            for route in page.data {
                if let Some(expression) = route.expression
                    && self.required.contains(&expression)
                {
                    present.insert(expression);
                }
            }
            next = page.next.filter(|n| !n.is_empty());
        }

        Ok(present.len())
    }
}

#[async_trait]
impl Probe for KongRoutesProbe {
    type Output = usize;

    fn target(&self) -> String {
        format!("kong routes at {}", self.admin_url)
    }

    async fn probe(&mut self) -> ProbeResult<usize> {
        match self.count_required_routes().await {
            Ok(count) if count == self.required.len() => ProbeResult::Converged(count),
            Ok(count) => ProbeResult::pending(format!(
                "{} of {} required routes present",
                count,
                self.required.len()
            )),
            Err(e) if is_gateway_starting(&e) => {
                ProbeResult::pending(format!("admin API unavailable: {}", e))
            }
            Err(e) => ProbeResult::Fatal(e),
        }
    }
}

/// Errors seen while Kong itself is still coming up.
fn is_gateway_starting(err: &Error) -> bool {
    matches!(
        err,
        Error::Transport(_) | Error::Http { status: 502..=504, .. }
    )
}

/// Wait until the gateway exposes every required route.
#[instrument(skip(http, policy, cancel))]
pub async fn wait_for_routes(
    http: HttpExecutor,
    admin_url: &str,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Converged<usize>> {
    let mut probe = KongRoutesProbe::new(http, admin_url);
    let converged = poller::poll(&mut probe, policy, cancel).await?;
    info!(
        routes = converged.value,
        attempts = converged.attempts,
        "Gateway routes ready"
    );
    Ok(converged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_expressions_are_distinct() {
        let set: HashSet<&str> = REQUIRED_ROUTE_EXPRESSIONS.iter().copied().collect();
        assert_eq!(set.len(), REQUIRED_ROUTE_EXPRESSIONS.len());
    }

    #[test]
    fn test_gateway_starting_classification() {
        let http = |status| Error::Http {
            method: "GET".to_string(),
            url: "http://kong:8001/routes".to_string(),
            status,
            body: String::new(),
        };

        assert!(is_gateway_starting(&Error::Transport("refused".to_string())));
        assert!(is_gateway_starting(&http(502)));
        assert!(is_gateway_starting(&http(503)));
        assert!(is_gateway_starting(&http(504)));

        assert!(!is_gateway_starting(&http(401)));
        assert!(!is_gateway_starting(&http(500)));
        assert!(!is_gateway_starting(&Error::InvalidInput("x".to_string())));
    }
}
