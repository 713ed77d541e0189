// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for eureka-core.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::http::HttpConfig;
use crate::probe::KafkaSettings;
use crate::types::ConsortiumTenant;

/// Environment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EurekaConfig {
    /// Environment name, prefix of consumer groups and topics.
    pub env_name: String,
    /// Kong proxy URL the platform APIs are served from.
    pub gateway_url: String,
    /// Kong admin API URL.
    pub kong_admin_url: String,
    /// Keycloak base URL.
    pub keycloak_url: String,
    /// Username of the central tenant's admin user.
    pub admin_username: String,
    /// Tenant registry file, if any.
    pub tenants_file: Option<PathBuf>,
    pub kafka: KafkaSettings,
    pub http: HttpConfig,
}

impl Default for EurekaConfig {
    fn default() -> Self {
        Self {
            env_name: "eureka".to_string(),
            gateway_url: "http://localhost:8000".to_string(),
            kong_admin_url: "http://localhost:8001".to_string(),
            keycloak_url: "http://localhost:8080".to_string(),
            admin_username: "admin".to_string(),
            tenants_file: None,
            kafka: KafkaSettings::default(),
            http: HttpConfig::default(),
        }
    }
}

impl EurekaConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `EUREKA_ENV_NAME`: Environment name (default: "eureka")
    /// - `EUREKA_GATEWAY_URL`: Kong proxy URL (default: "http://localhost:8000")
    /// - `EUREKA_KONG_ADMIN_URL`: Kong admin URL (default: "http://localhost:8001")
    /// - `EUREKA_KEYCLOAK_URL`: Keycloak URL (default: "http://localhost:8080")
    /// - `EUREKA_ADMIN_USERNAME`: Central admin username (default: "admin")
    /// - `EUREKA_KAFKA_CONTAINER`: Broker container (default: "kafka")
    /// - `EUREKA_KAFKA_BOOTSTRAP`: Bootstrap server (default: "kafka:9092")
    /// - `EUREKA_HTTP_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    /// - `EUREKA_HTTP_MAX_ATTEMPTS`: Attempts per retryable request (default: 3)
    /// - `EUREKA_TENANTS_FILE`: Tenant registry JSON file (default: unset)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let request_timeout_ms: u64 = get("EUREKA_HTTP_TIMEOUT_MS", "30000")
            .parse()
            .map_err(|e| Error::Config(format!("invalid EUREKA_HTTP_TIMEOUT_MS: {}", e)))?;

        let max_attempts: u32 = get("EUREKA_HTTP_MAX_ATTEMPTS", "3")
            .parse()
            .map_err(|e| Error::Config(format!("invalid EUREKA_HTTP_MAX_ATTEMPTS: {}", e)))?;

        Ok(Self {
            env_name: get("EUREKA_ENV_NAME", &defaults.env_name),
            gateway_url: get("EUREKA_GATEWAY_URL", &defaults.gateway_url),
            kong_admin_url: get("EUREKA_KONG_ADMIN_URL", &defaults.kong_admin_url),
            keycloak_url: get("EUREKA_KEYCLOAK_URL", &defaults.keycloak_url),
            admin_username: get("EUREKA_ADMIN_USERNAME", &defaults.admin_username),
            tenants_file: lookup("EUREKA_TENANTS_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            kafka: KafkaSettings {
                container: get("EUREKA_KAFKA_CONTAINER", &defaults.kafka.container),
                bootstrap_server: get("EUREKA_KAFKA_BOOTSTRAP", &defaults.kafka.bootstrap_server),
                ..defaults.kafka
            },
            http: HttpConfig {
                request_timeout: Duration::from_millis(request_timeout_ms),
                max_attempts,
                ..defaults.http
            },
        })
    }

    /// Set the environment name.
    pub fn with_env_name(mut self, name: impl Into<String>) -> Self {
        self.env_name = name.into();
        self
    }

    /// Set the gateway URL.
    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    /// Set the Kong admin URL.
    pub fn with_kong_admin_url(mut self, url: impl Into<String>) -> Self {
        self.kong_admin_url = url.into();
        self
    }

    /// Set the tenant registry file.
    pub fn with_tenants_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tenants_file = Some(path.into());
        self
    }

    /// Load the tenant registry, empty when no file is configured.
    pub fn load_tenants(&self) -> Result<TenantRegistry> {
        match &self.tenants_file {
            Some(path) => TenantRegistry::from_file(path),
            None => Ok(TenantRegistry::default()),
        }
    }
}

/// How one tenant takes part in a consortium.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantProfile {
    /// Consortium the tenant belongs to, if any.
    #[serde(default)]
    pub consortium: Option<String>,
    /// Whether the tenant is the consortium hub.
    #[serde(default)]
    pub central: bool,
}

/// Tenants of the environment, keyed by name.
///
/// JSON form: `{"tenants": {"<name>": {"consortium": "<name>", "central": true}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRegistry {
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantProfile>,
}

impl TenantRegistry {
    /// Parse a registry from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let registry: TenantRegistry = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("invalid tenant registry: {}", e)))?;
        registry.validate()?;
        Ok(registry)
    }

    /// Read a registry file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read tenant registry {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    /// Add a tenant.
    pub fn with_tenant(
        mut self,
        name: impl Into<String>,
        consortium: Option<&str>,
        central: bool,
    ) -> Self {
        self.tenants.insert(
            name.into(),
            TenantProfile {
                consortium: consortium.map(str::to_string),
                central,
            },
        );
        self
    }

    /// Tenants of a consortium, in name order.
    pub fn consortium_tenants(&self, consortium: &str) -> Vec<ConsortiumTenant> {
        self.tenants
            .iter()
            .filter(|(_, profile)| profile.consortium.as_deref() == Some(consortium))
            .map(|(name, profile)| ConsortiumTenant {
                name: name.clone(),
                is_central: profile.central,
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if let Some(blank) = self.tenants.keys().find(|name| name.trim().is_empty()) {
            return Err(Error::Config(format!(
                "tenant registry contains a blank tenant name: {:?}",
                blank
            )));
        }
        Ok(())
    }
}
