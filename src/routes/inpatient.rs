//! Inpatient ward and admission-schedule routes.
//!
//! The schedule routes address nested upstream resources: the admission id
//! and the scheduled item id arrive as query parameters and become path
//! segments upstream.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::upstream::{relay, UpstreamRequest};
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inpatient/fetch-wards", get(fetch_wards))
        .route("/inpatient/scheduled_drug", patch(update_scheduled_drug))
        .route(
            "/inpatient/scheduled_lab_test",
            patch(update_scheduled_lab_test).post(create_scheduled_lab_test),
        )
}

async fn fetch_wards(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, "/inpatient/wards/")
                .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

fn require(param: Option<String>, name: &str) -> Result<String, GatewayError> {
    param
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GatewayError::BadRequest(format!("{name} query param is required")))
}

#[derive(Debug, Deserialize)]
struct ScheduledDrugParams {
    admission_id: Option<String>,
    scheduled_drug_id: Option<String>,
}

async fn update_scheduled_drug(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ScheduledDrugParams>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let admission_id = require(params.admission_id, "admission_id")?;
    let drug_id = require(params.scheduled_drug_id, "scheduled_drug_id")?;

    let config = state.config();
    let path =
        format!("/inpatient/patient-admissions/{admission_id}/scheduled_drug/{drug_id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::PATCH, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

#[derive(Debug, Deserialize)]
struct ScheduledLabTestParams {
    admission_id: Option<String>,
    scheduled_id: Option<String>,
}

async fn update_scheduled_lab_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ScheduledLabTestParams>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let admission_id = require(params.admission_id, "admission_id")?;
    let scheduled_id = require(params.scheduled_id, "scheduled_id")?;

    let config = state.config();
    let path = format!(
        "/inpatient/patient-admissions/{admission_id}/scheduled_lab_test/{scheduled_id}/"
    );
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::PATCH, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

async fn create_scheduled_lab_test(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ScheduledLabTestParams>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let admission_id = require(params.admission_id, "admission_id")?;

    let config = state.config();
    let path = format!("/inpatient/patient-admissions/{admission_id}/scheduled_lab_test/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::POST, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}
