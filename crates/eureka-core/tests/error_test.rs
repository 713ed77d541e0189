// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for error types and error handling.

use eureka_core::{Error, PollError, TenantProvisioningStatus};

// ============================================================================
// Error Display Tests
// ============================================================================

#[test]
fn test_config_error_display() {
    let err = Error::Config("missing EUREKA_GATEWAY_URL".to_string());
    assert_eq!(
        err.to_string(),
        "configuration error: missing EUREKA_GATEWAY_URL"
    );
}

#[test]
fn test_http_error_display() {
    let err = Error::Http {
        method: "GET".to_string(),
        url: "http://gw/consortia".to_string(),
        status: 401,
        body: "Unauthorized".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "GET http://gw/consortia returned 401: Unauthorized"
    );
}

#[test]
fn test_tenant_setup_failed_display() {
    let err = Error::TenantSetupFailed {
        tenant: "college".to_string(),
        status: TenantProvisioningStatus::CompletedWithErrors,
    };
    assert_eq!(
        err.to_string(),
        "tenant college setup finished with status COMPLETED_WITH_ERRORS"
    );
}

#[test]
fn test_command_error_display() {
    let err = Error::Command {
        program: "docker exec kafka".to_string(),
        message: "No such container".to_string(),
    };
    assert!(err.to_string().contains("docker exec kafka"));
    assert!(err.to_string().contains("No such container"));
}

#[test]
fn test_poll_errors_are_transparent() {
    let err: Error = PollError::RebalanceTimeout {
        target: "eureka-mod-users-group".to_string(),
        attempts: 10,
    }
    .into();
    assert_eq!(
        err.to_string(),
        "consumer group eureka-mod-users-group was still rebalancing after 10 attempts"
    );

    let err: Error = PollError::Cancelled {
        target: "kong routes".to_string(),
    }
    .into();
    assert_eq!(err.to_string(), "waiting for kong routes was cancelled");
}

// ============================================================================
// Conversions
// ============================================================================

#[test]
fn test_from_io_error() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "docker not found");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_from_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: Error = json_err.into();
    assert!(matches!(err, Error::Json(_)));
    assert!(err.to_string().starts_with("JSON error:"));
}

// ============================================================================
// Retry classification
// ============================================================================

#[test]
fn test_retryable_classification() {
    let http = |status| Error::Http {
        method: "GET".to_string(),
        url: "http://gw".to_string(),
        status,
        body: String::new(),
    };

    assert!(Error::Transport("reset".to_string()).is_retryable());
    assert!(http(429).is_retryable());
    assert!(http(503).is_retryable());

    assert!(!http(400).is_retryable());
    assert!(!http(404).is_retryable());
    assert!(!http(500).is_retryable());
    assert!(!Error::InvalidInput("blank".to_string()).is_retryable());
    assert!(
        !Error::AdminUserNotFound {
            tenant: "diku".to_string(),
            username: "admin".to_string(),
        }
        .is_retryable()
    );
}
