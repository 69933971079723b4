//! Credential policy: enforcing routes reject before upstream contact,
//! passthrough routes forward whatever the caller sent.

mod common;

use common::{client, spawn_gateway, MockUpstream};

#[tokio::test]
async fn create_group_without_credential_is_401_before_upstream() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .post(gateway.url("/api/groups/create-group"))
        .json(&serde_json::json!({"name": "lab-techs"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
    assert!(upstream.received().is_empty());
}

#[tokio::test]
async fn enforcing_reads_also_reject_missing_credential() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;
    let http = client();

    for path in [
        "/api/billing/fetch-invoices",
        "/api/inventory/fetch-inventory",
        "/api/laboratory/recent-reagent-usage",
        "/api/pharmacy/drug-categories",
        "/api/inpatient/fetch-wards",
    ] {
        let response = http.get(gateway.url(path)).send().await.unwrap();
        assert_eq!(response.status(), 401, "expected 401 for {path}");
    }
    assert!(upstream.received().is_empty());
}

#[tokio::test]
async fn patient_routes_forward_without_credential() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .get(gateway.url("/api/patient"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let received = upstream.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].authorization, None);
}

#[tokio::test]
async fn credential_reaches_upstream_verbatim() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    client()
        .get(gateway.url("/api/inventory/fetch-inventory"))
        .header("authorization", "Bearer eyJhbGciOi.abc.def")
        .send()
        .await
        .unwrap();

    let received = upstream.received();
    assert_eq!(
        received[0].authorization.as_deref(),
        Some("Bearer eyJhbGciOi.abc.def")
    );
}

#[tokio::test]
async fn password_reset_needs_no_credential() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .post(gateway.url("/api/register/change-password/MQ/tok-123"))
        .json(&serde_json::json!({"password": "new-password"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let received = upstream.received();
    assert_eq!(
        received[0].path_and_query,
        "/customuser/password-reset/confirm/MQ/tok-123/"
    );
    assert_eq!(received[0].authorization, None);
    assert_eq!(&received[0].body[..], br#"{"password":"new-password"}"#);
}
