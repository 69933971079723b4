//! JSON forwarding behavior: verbatim relays, query construction, error
//! mapping, and the route-level rejections that never reach the upstream.

mod common;

use common::{client, spawn_gateway, CannedResponse, MockUpstream};

#[tokio::test]
async fn success_relays_status_and_body_verbatim() {
    let upstream = MockUpstream::start().await;
    upstream.respond_with(CannedResponse::json(
        200,
        r#"{"count":2,"results":[{"id":1},{"id":2}]}"#,
    ));
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .get(gateway.url("/api/patient?search_value=doe"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..], br#"{"count":2,"results":[{"id":1},{"id":2}]}"#);

    let received = upstream.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "GET");
    assert_eq!(received[0].path_and_query, "/patients/patients/?search=doe");
    assert_eq!(received[0].authorization.as_deref(), Some("Bearer token-1"));
}

#[tokio::test]
async fn structured_upstream_error_is_reproduced_exactly() {
    let upstream = MockUpstream::start().await;
    upstream.respond_with(CannedResponse::json(
        422,
        r#"{"detail":"invoice_number already exists"}"#,
    ));
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .post(gateway.url("/api/billing/fetch-invoices"))
        .header("authorization", "Bearer token-1")
        .json(&serde_json::json!({"invoice_number": "INV-100"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"detail":"invoice_number already exists"}"#
    );

    let received = upstream.received();
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].path_and_query, "/billing/invoices/");
    assert_eq!(&received[0].body[..], br#"{"invoice_number":"INV-100"}"#);
}

#[tokio::test]
async fn unreachable_upstream_becomes_500_with_message() {
    // Bind then drop to get a port nothing listens on.
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let gateway = spawn_gateway(&format!("http://{dead_addr}")).await;

    let response = client()
        .get(gateway.url("/api/inpatient/fetch-wards"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn unknown_path_is_404_without_upstream_contact() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .get(gateway.url("/api/no-such-family/thing"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "path not found");
    assert!(upstream.received().is_empty());
}

#[tokio::test]
async fn unsupported_method_is_405_with_allow_header() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .delete(gateway.url("/api/billing/fetch-invoices"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
    assert!(response.headers().contains_key("allow"));
    assert!(upstream.received().is_empty());
}

#[tokio::test]
async fn invoice_query_composed_from_recognized_params_only() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;
    let http = client();

    // No search_field: only the mandatory search pair.
    http.get(gateway.url("/api/billing/fetch-invoices?search_value=INV-100&unrecognized=x"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    // Field plus status filter.
    http.get(gateway.url(
        "/api/billing/fetch-invoices?search_field=invoice_number&search_value=INV-100&status=pending",
    ))
    .header("authorization", "Bearer token-1")
    .send()
    .await
    .unwrap();

    // status=all is dropped, absent search becomes blank.
    http.get(gateway.url("/api/billing/fetch-invoices?status=all"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    let received = upstream.received();
    assert_eq!(received[0].path_and_query, "/billing/invoices/?search=INV-100");
    assert_eq!(
        received[1].path_and_query,
        "/billing/invoices/?search_field=invoice_number&search=INV-100&status=pending"
    );
    assert_eq!(received[2].path_and_query, "/billing/invoices/?search=");
}

#[tokio::test]
async fn inventory_query_always_carries_department_and_item() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    client()
        .get(gateway.url("/api/inventory/fetch-inventory?search_value=gauze"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    let received = upstream.received();
    assert_eq!(
        received[0].path_and_query,
        "/inventory/inventories/?department_name=&item=&search=gauze"
    );
}

#[tokio::test]
async fn scheduled_drug_patch_builds_nested_upstream_path() {
    let upstream = MockUpstream::start().await;
    upstream.respond_with(CannedResponse::json(200, r#"{"status":"administered"}"#));
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .patch(gateway.url("/api/inpatient/scheduled_drug?admission_id=9&scheduled_drug_id=4"))
        .json(&serde_json::json!({"status": "administered"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"status":"administered"}"#
    );

    let received = upstream.received();
    assert_eq!(received[0].method, "PATCH");
    assert_eq!(
        received[0].path_and_query,
        "/inpatient/patient-admissions/9/scheduled_drug/4/"
    );
}

#[tokio::test]
async fn patient_edit_addresses_upstream_by_body_id() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .put(gateway.url("/api/patient"))
        .json(&serde_json::json!({"id": 12, "first_name": "Jane"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let received = upstream.received();
    // The upstream detail endpoint takes a POST for edits.
    assert_eq!(received[0].method, "POST");
    assert_eq!(received[0].path_and_query, "/patients/patients/12/");

    // Missing id never reaches the upstream.
    let response = client()
        .put(gateway.url("/api/patient"))
        .json(&serde_json::json!({"first_name": "Jane"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(upstream.received().len(), 1);
}

#[tokio::test]
async fn patient_profile_falls_back_on_404() {
    let upstream = MockUpstream::start().await;
    upstream.enqueue(CannedResponse::json(404, r#"{"detail":"Not found."}"#));
    upstream.enqueue(CannedResponse::json(200, r#"{"profile":{"user":33}}"#));
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .get(gateway.url("/api/patient/patient-profile?userId=33"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), r#"{"profile":{"user":33}}"#);

    let received = upstream.received();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].path_and_query, "/patients/patients/33/");
    assert_eq!(
        received[1].path_and_query,
        "/patients/patient-profile/?userId=33"
    );
}

#[tokio::test]
async fn patient_profile_requires_user_id() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .get(gateway.url("/api/patient/patient-profile"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert!(upstream.received().is_empty());
}

#[tokio::test]
async fn profile_non_404_errors_are_not_retried_against_fallback() {
    let upstream = MockUpstream::start().await;
    upstream.enqueue(CannedResponse::json(403, r#"{"detail":"Forbidden"}"#));
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .get(gateway.url("/api/patient/patient-profile?userId=33"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    assert_eq!(upstream.received().len(), 1);
}

#[tokio::test]
async fn triage_request_carries_empty_json_object() {
    let upstream = MockUpstream::start().await;
    upstream.respond_with(CannedResponse::json(200, r#"{"queued":true}"#));
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client()
        .post(gateway.url("/api/ai-triage/request"))
        .json(&serde_json::json!({"patient_id": 7}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let received = upstream.received();
    assert_eq!(received[0].path_and_query, "/ai/triage/request/7/");
    assert_eq!(&received[0].body[..], b"{}");
}

#[tokio::test]
async fn lab_settings_switches_on_get_settings_flag() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;
    let http = client();

    http.get(gateway.url("/api/laboratory/lab-settings"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();
    http.get(gateway.url("/api/laboratory/lab-settings?get_settings=true"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();

    let received = upstream.received();
    assert_eq!(received[0].path_and_query, "/lab/lab-settings/");
    assert_eq!(received[1].path_and_query, "/lab/lab-settings/get_settings/");
}

#[tokio::test]
async fn interpretation_id_resolution_order() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;
    let http = client();

    // Query id wins.
    http.patch(gateway.url("/api/laboratory/lab-test-interpretations?id=5"))
        .header("authorization", "Bearer token-1")
        .json(&serde_json::json!({"id": 9, "notes": "x"}))
        .send()
        .await
        .unwrap();
    // Alternate query key.
    http.patch(gateway.url(
        "/api/laboratory/lab-test-interpretations?lab_test_interpretation_id=6",
    ))
    .header("authorization", "Bearer token-1")
    .json(&serde_json::json!({"notes": "x"}))
    .send()
    .await
    .unwrap();
    // Body id as last resort.
    http.patch(gateway.url("/api/laboratory/lab-test-interpretations"))
        .header("authorization", "Bearer token-1")
        .json(&serde_json::json!({"id": 7, "notes": "x"}))
        .send()
        .await
        .unwrap();

    let received = upstream.received();
    assert_eq!(received[0].path_and_query, "/lab/lab-test-interpretations/5/");
    assert_eq!(received[1].path_and_query, "/lab/lab-test-interpretations/6/");
    assert_eq!(received[2].path_and_query, "/lab/lab-test-interpretations/7/");
    assert!(received.iter().all(|r| r.method == "PATCH"));

    // No id anywhere → 400, upstream untouched.
    let response = http
        .delete(gateway.url("/api/laboratory/lab-test-interpretations"))
        .header("authorization", "Bearer token-1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(upstream.received().len(), 3);
}

#[tokio::test]
async fn full_query_passthrough_routes_forward_verbatim() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;
    let http = client();

    http.get(gateway.url("/api/billing/payment-receipts?from=2024-01-01&to=2024-02-01"))
        .send()
        .await
        .unwrap();
    http.get(gateway.url("/api/inventory/units?page=2"))
        .send()
        .await
        .unwrap();

    let received = upstream.received();
    assert_eq!(
        received[0].path_and_query,
        "/billing/payment-receipts/?from=2024-01-01&to=2024-02-01"
    );
    assert_eq!(received[1].path_and_query, "/inventory/units/?page=2");
}

#[tokio::test]
async fn health_endpoint_is_local() {
    let upstream = MockUpstream::start().await;
    let gateway = spawn_gateway(&upstream.base_url()).await;

    let response = client().get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(upstream.received().is_empty());
}
