// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Consortium provisioning sequence tests against a scripted gateway.

use std::sync::Arc;
use std::time::Duration;

use eureka_core::http::mock::{json, status, url_path};
use eureka_core::http::{HttpBody, HttpMethod, MockTransport};
use eureka_core::{
    ConsortiumProvisioner, Error, HttpExecutor, PollError, PollPolicy, ProvisionerSettings,
    ProvisioningEvent, TenantProvisioningStatus, TenantRegistry,
};
use serde_json::{Value, json as json_value};
use tokio_util::sync::CancellationToken;

const GATEWAY: &str = "http://gateway:8000";
const TOKEN: &str = "central-token";

fn registry() -> TenantRegistry {
    // "alpha-member" sorts before "zeta-central" by name
    TenantRegistry::default()
        .with_tenant("alpha-member", Some("cons1"), false)
        .with_tenant("zeta-central", Some("cons1"), true)
        .with_tenant("unrelated", Some("cons2"), true)
}

fn provisioner(mock: &MockTransport, token: &str) -> ConsortiumProvisioner {
    let http = HttpExecutor::new(Arc::new(mock.clone())).with_retry(1, Duration::ZERO);
    let settings = ProvisionerSettings {
        gateway_url: GATEWAY.to_string(),
        admin_username: "admin".to_string(),
        status_policy: PollPolicy::new(5, Duration::from_secs(1)),
    };
    ConsortiumProvisioner::new(http, settings, registry(), token)
}

fn setup_status(status: &str) -> Value {
    json_value!({ "id": "t", "name": "t", "setupStatus": status, "isCentral": false })
}

fn tenant_records(names: &[(&str, bool)]) -> Value {
    let tenants: Vec<Value> = names
        .iter()
        .map(|(name, central)| {
            json_value!({ "id": name, "code": "XXX", "name": name, "isCentral": central })
        })
        .collect();
    json_value!({ "tenants": tenants, "totalRecords": names.len() })
}

async fn existing_consortium(mock: &MockTransport) {
    mock.on(
        HttpMethod::Get,
        "/consortia",
        vec![json(
            200,
            json_value!({
                "consortia": [{ "id": "c1", "name": "cons1" }],
                "totalRecords": 1
            }),
        )],
    )
    .await;
}

async fn admin_user(mock: &MockTransport) {
    mock.on(
        HttpMethod::Get,
        "/users",
        vec![json(
            200,
            json_value!({
                "users": [{ "id": "admin-uuid", "username": "admin" }],
                "totalRecords": 1
            }),
        )],
    )
    .await;
}

async fn post_paths(mock: &MockTransport) -> Vec<String> {
    mock.requests()
        .await
        .into_iter()
        .filter(|r| r.method == HttpMethod::Post)
        .map(|r| r.url.trim_start_matches(GATEWAY).to_string())
        .collect()
}

// ============================================================================
// Full sequence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_provisions_central_before_member() {
    let mock = MockTransport::new();
    existing_consortium(&mock).await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants",
        vec![json(200, tenant_records(&[]))],
    )
    .await;
    mock.on(HttpMethod::Post, "/consortia/c1/tenants", vec![status(201)])
        .await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants/zeta-central",
        vec![
            json(200, setup_status("IN_PROGRESS")),
            json(200, setup_status("COMPLETED")),
        ],
    )
    .await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants/alpha-member",
        vec![json(200, setup_status("COMPLETED"))],
    )
    .await;
    admin_user(&mock).await;

    let report = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap();

    assert_eq!(report.consortium_id, "c1");
    assert_eq!(
        report.events,
        vec![
            ProvisioningEvent::ConsortiumFound {
                id: "c1".to_string()
            },
            ProvisioningEvent::TenantCreated {
                tenant: "zeta-central".to_string(),
                central: true,
                attempts: 2,
            },
            ProvisioningEvent::TenantCreated {
                tenant: "alpha-member".to_string(),
                central: false,
                attempts: 1,
            },
        ]
    );

    let requests = mock.requests().await;
    let sequence: Vec<(HttpMethod, &str)> = requests
        .iter()
        .map(|r| (r.method, url_path(&r.url)))
        .collect();
    assert_eq!(
        sequence,
        vec![
            (HttpMethod::Get, "/consortia"),
            (HttpMethod::Get, "/consortia/c1/tenants"),
            (HttpMethod::Post, "/consortia/c1/tenants"),
            (HttpMethod::Get, "/consortia/c1/tenants/zeta-central"),
            (HttpMethod::Get, "/consortia/c1/tenants/zeta-central"),
            (HttpMethod::Get, "/users"),
            (HttpMethod::Post, "/consortia/c1/tenants"),
            (HttpMethod::Get, "/consortia/c1/tenants/alpha-member"),
        ]
    );

    assert_eq!(
        post_paths(&mock).await,
        vec![
            "/consortia/c1/tenants".to_string(),
            "/consortia/c1/tenants?adminUserId=admin-uuid".to_string(),
        ]
    );

    let posts: Vec<_> = requests
        .iter()
        .filter(|r| r.method == HttpMethod::Post)
        .collect();
    match &posts[0].body {
        Some(HttpBody::Json(body)) => {
            assert_eq!(body["id"], "zeta-central");
            assert_eq!(body["name"], "zeta-central");
            assert_eq!(body["code"], "ZET");
            assert_eq!(body["isCentral"], true);
        }
        other => panic!("expected JSON body, got {:?}", other),
    }
    match &posts[1].body {
        Some(HttpBody::Json(body)) => assert_eq!(body["isCentral"], false),
        other => panic!("expected JSON body, got {:?}", other),
    }

    for request in &requests {
        assert_eq!(request.header("X-Okapi-Tenant"), Some("zeta-central"));
        assert_eq!(request.header("X-Okapi-Token"), Some(TOKEN));
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_run_makes_no_writes() {
    let mock = MockTransport::new();
    existing_consortium(&mock).await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants",
        vec![
            json(200, tenant_records(&[])),
            json(
                200,
                tenant_records(&[("zeta-central", true), ("alpha-member", false)]),
            ),
        ],
    )
    .await;
    mock.on(HttpMethod::Post, "/consortia/c1/tenants", vec![status(201)])
        .await;
    mock.on_prefix(
        HttpMethod::Get,
        "/consortia/c1/tenants/",
        vec![json(200, setup_status("COMPLETED"))],
    )
    .await;
    admin_user(&mock).await;

    let provisioner = provisioner(&mock, TOKEN);
    let first = provisioner
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap();
    assert!(first.made_changes());
    assert_eq!(first.created_tenants(), vec!["zeta-central", "alpha-member"]);
    let posts_after_first = mock.count(HttpMethod::Post).await;

    let second = provisioner
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap();

    assert_eq!(second.consortium_id, first.consortium_id);
    assert!(!second.made_changes());
    assert!(second.created_tenants().is_empty());
    assert_eq!(mock.count(HttpMethod::Post).await, posts_after_first);
    assert!(second.events.contains(&ProvisioningEvent::TenantSkipped {
        tenant: "alpha-member".to_string()
    }));
}

#[tokio::test(start_paused = true)]
async fn test_creates_missing_consortium_with_fresh_id() {
    let mock = MockTransport::new();
    mock.on(
        HttpMethod::Get,
        "/consortia",
        vec![json(200, json_value!({ "consortia": [], "totalRecords": 0 }))],
    )
    .await;
    mock.on(HttpMethod::Post, "/consortia", vec![status(201)]).await;
    mock.on_match(
        |req| {
            let path = url_path(&req.url);
            req.method == HttpMethod::Get
                && path.starts_with("/consortia/")
                && path.ends_with("/tenants")
        },
        vec![json(200, tenant_records(&[]))],
    )
    .await;
    mock.on_match(
        |req| req.method == HttpMethod::Post && url_path(&req.url).ends_with("/tenants"),
        vec![status(201)],
    )
    .await;
    mock.on_match(
        |req| req.method == HttpMethod::Get && url_path(&req.url).contains("/tenants/"),
        vec![json(200, setup_status("COMPLETED"))],
    )
    .await;
    admin_user(&mock).await;

    let report = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap();

    let id = uuid::Uuid::parse_str(&report.consortium_id).unwrap();
    assert_eq!(id.get_version_num(), 4);
    assert_eq!(
        report.events[0],
        ProvisioningEvent::ConsortiumCreated {
            id: report.consortium_id.clone()
        }
    );

    let requests = mock.requests().await;
    let create = requests
        .iter()
        .find(|r| r.method == HttpMethod::Post && url_path(&r.url) == "/consortia")
        .unwrap();
    match &create.body {
        Some(HttpBody::Json(body)) => {
            assert_eq!(body["id"], report.consortium_id.as_str());
            assert_eq!(body["name"], "cons1");
        }
        other => panic!("expected JSON body, got {:?}", other),
    }
    assert!(post_paths(&mock)
        .await
        .contains(&format!("/consortia/{}/tenants", report.consortium_id)));
}

#[tokio::test(start_paused = true)]
async fn test_lookup_requests_full_page_of_consortia() {
    let mock = MockTransport::new();
    // first page only holds other consortia
    mock.on(
        HttpMethod::Get,
        "/consortia",
        vec![json(
            200,
            json_value!({
                "consortia": [
                    { "id": "o1", "name": "other-1" },
                    { "id": "o2", "name": "other-2" }
                ],
                "totalRecords": 12
            }),
        )],
    )
    .await;
    mock.on(HttpMethod::Post, "/consortia", vec![status(201)]).await;
    mock.on_match(
        |req| req.method == HttpMethod::Get && url_path(&req.url).ends_with("/tenants"),
        vec![json(200, tenant_records(&[("zeta-central", true), ("alpha-member", false)]))],
    )
    .await;

    let report = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap();

    let requests = mock.requests().await;
    assert_eq!(requests[0].method, HttpMethod::Get);
    assert_eq!(requests[0].url, format!("{}/consortia?limit=1000", GATEWAY));
    assert!(matches!(
        report.events[0],
        ProvisioningEvent::ConsortiumCreated { .. }
    ));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_sends_no_writes() {
    let mock = MockTransport::new();
    mock.on(
        HttpMethod::Get,
        "/consortia",
        vec![json(200, json_value!({ "consortia": [], "totalRecords": 0 }))],
    )
    .await;
    mock.on_prefix(HttpMethod::Post, "/consortia", vec![status(201)])
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = provisioner(&mock, TOKEN)
        .with_cancellation(cancel)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Poll(PollError::Cancelled { .. })));
    assert_eq!(mock.count(HttpMethod::Post).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_setup_wait_skips_remaining_tenants() {
    let mock = MockTransport::new();
    existing_consortium(&mock).await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants",
        vec![json(200, tenant_records(&[]))],
    )
    .await;
    mock.on(HttpMethod::Post, "/consortia/c1/tenants", vec![status(201)])
        .await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants/zeta-central",
        vec![json(200, setup_status("IN_PROGRESS"))],
    )
    .await;
    admin_user(&mock).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        trigger.cancel();
    });

    let err = provisioner(&mock, TOKEN)
        .with_cancellation(cancel)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Poll(PollError::Cancelled { .. })));
    assert_eq!(
        post_paths(&mock).await,
        vec!["/consortia/c1/tenants".to_string()]
    );
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_setup_stops_sequence() {
    let mock = MockTransport::new();
    existing_consortium(&mock).await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants",
        vec![json(200, tenant_records(&[]))],
    )
    .await;
    mock.on(HttpMethod::Post, "/consortia/c1/tenants", vec![status(201)])
        .await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants/zeta-central",
        vec![
            json(200, setup_status("IN_PROGRESS")),
            json(200, setup_status("FAILED")),
        ],
    )
    .await;
    admin_user(&mock).await;

    let err = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap_err();

    match err {
        Error::TenantSetupFailed { tenant, status } => {
            assert_eq!(tenant, "zeta-central");
            assert_eq!(status, TenantProvisioningStatus::Failed);
        }
        other => panic!("expected setup failure, got {:?}", other),
    }
    assert_eq!(mock.count(HttpMethod::Post).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_blank_token_sends_nothing() {
    let mock = MockTransport::new();

    let err = provisioner(&mock, "  ")
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(mock.requests().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_blank_consortium_name_rejected() {
    let mock = MockTransport::new();

    let err = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("", "zeta-central")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(mock.requests().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_missing_admin_user() {
    let mock = MockTransport::new();
    existing_consortium(&mock).await;
    mock.on(
        HttpMethod::Get,
        "/consortia/c1/tenants",
        vec![json(200, tenant_records(&[("zeta-central", true)]))],
    )
    .await;
    mock.on(
        HttpMethod::Get,
        "/users",
        vec![json(200, json_value!({ "users": [], "totalRecords": 0 }))],
    )
    .await;

    let err = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap_err();

    match err {
        Error::AdminUserNotFound { tenant, username } => {
            assert_eq!(tenant, "zeta-central");
            assert_eq!(username, "admin");
        }
        other => panic!("expected missing admin user, got {:?}", other),
    }
    assert_eq!(mock.count(HttpMethod::Post).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_gateway_error_propagates() {
    let mock = MockTransport::new();
    mock.on(HttpMethod::Get, "/consortia", vec![status(401)]).await;

    let err = provisioner(&mock, TOKEN)
        .ensure_consortium_provisioned("cons1", "zeta-central")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Http { status: 401, .. }));
    assert_eq!(mock.count(HttpMethod::Post).await, 0);
}
