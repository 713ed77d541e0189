// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tenant registry file loading tests.

use std::io::Write;

use eureka_core::{ConsortiumTenant, Error, EurekaConfig, TenantRegistry, sort_tenants};

fn registry_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_registry_from_configured_file() {
    let file = registry_file(
        r#"{
            "tenants": {
                "university": {"consortium": "cons1", "central": true},
                "college": {"consortium": "cons1"},
                "diku": {}
            }
        }"#,
    );

    let config = EurekaConfig::new().with_tenants_file(file.path());
    let registry = config.load_tenants().unwrap();

    assert_eq!(registry.tenants.len(), 3);
    assert_eq!(
        sort_tenants(registry.consortium_tenants("cons1")),
        vec![
            ConsortiumTenant::central("university"),
            ConsortiumTenant::member("college"),
        ]
    );
}

#[test]
fn test_no_file_means_empty_registry() {
    let registry = EurekaConfig::new().load_tenants().unwrap();
    assert!(registry.tenants.is_empty());
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = TenantRegistry::from_file(&dir.path().join("tenants.json"));

    match result {
        Err(Error::Config(message)) => assert!(message.contains("tenants.json")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = registry_file("{ not json");
    let result = TenantRegistry::from_file(file.path());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_from_env_reads_tenants_file() {
    let config = EurekaConfig::from_lookup(|key| match key {
        "EUREKA_TENANTS_FILE" => Some("/etc/eureka/tenants.json".to_string()),
        "EUREKA_GATEWAY_URL" => Some("http://gateway:8000".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(
        config.tenants_file.as_deref(),
        Some(std::path::Path::new("/etc/eureka/tenants.json"))
    );
    assert_eq!(config.gateway_url, "http://gateway:8000");
    assert_eq!(config.kong_admin_url, "http://localhost:8001");
}

#[test]
fn test_empty_tenants_file_variable_is_unset() {
    let config = EurekaConfig::from_lookup(|key| {
        (key == "EUREKA_TENANTS_FILE").then(String::new)
    })
    .unwrap();
    assert!(config.tenants_file.is_none());
}
