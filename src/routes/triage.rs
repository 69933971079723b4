//! AI triage request/result routes.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::upstream::{relay, UpstreamRequest};
use crate::http::server::AppState;
use crate::routes::body_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai-triage/request", post(request_triage))
        .route("/ai-triage/results", get(triage_results))
}

/// The patient id rides in the inbound body but addresses the upstream
/// path; the upstream call carries an empty JSON object.
async fn request_triage(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let parsed: Value = serde_json::from_slice(&body)
        .map_err(|_| GatewayError::BadRequest("request body must be JSON".to_string()))?;
    let patient_id = body_id(&parsed, "patient_id")
        .ok_or_else(|| GatewayError::BadRequest("patient_id is required".to_string()))?;

    let config = state.config();
    let path = format!("/ai/triage/request/{patient_id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::POST, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers))
                .json_body(Bytes::from_static(b"{}")),
        )
        .await?;
    Ok(relay(reply))
}

#[derive(Debug, Deserialize)]
struct ResultsParams {
    patient_id: Option<String>,
}

async fn triage_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ResultsParams>,
) -> Result<Response, GatewayError> {
    let patient_id = params
        .patient_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("patient_id query param is required".to_string()))?;

    let config = state.config();
    let path = format!("/ai/triage/results/{patient_id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers)),
        )
        .await?;
    Ok(relay(reply))
}
