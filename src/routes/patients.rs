//! Patient registration and profile routes.
//!
//! These are the historically unauthenticated routes: the credential is
//! forwarded when present, but absence is not rejected locally — the
//! upstream enforces access.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::query;
use crate::gateway::upstream::{relay, UpstreamRequest};
use crate::http::server::AppState;
use crate::routes::body_id;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/patient",
            get(list_patients).post(register_patient).put(edit_patient),
        )
        .route(
            "/patient/patient-profile",
            get(patient_profile).post(consult_patient).put(edit_patient),
        )
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    search_field: Option<String>,
    search_value: Option<String>,
}

async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let path = format!(
        "/patients/patients/{}",
        query::search_query(params.search_field.as_deref(), params.search_value.as_deref())
    );
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers)),
        )
        .await?;
    Ok(relay(reply))
}

async fn register_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::POST, &config.upstream.base_url, "/patients/patients/")
                .authorization(auth::bearer(&headers))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

/// Edit is addressed by the `id` inside the JSON body; the upstream detail
/// endpoint expects a POST.
async fn edit_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let parsed: Value = serde_json::from_slice(&body)
        .map_err(|_| GatewayError::BadRequest("request body must be JSON".to_string()))?;
    let id = body_id(&parsed, "id")
        .ok_or_else(|| GatewayError::BadRequest("id is required".to_string()))?;

    let config = state.config();
    let path = format!("/patients/patients/{id}/");
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

#[derive(Debug, Deserialize)]
struct ProfileParams {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// The profile lookup is used with two different kinds of ids: sometimes a
/// patient id, sometimes a user id. Patient detail is tried first; a 404
/// falls back to the user-keyed profile endpoint. Any other upstream
/// answer is relayed as-is.
async fn patient_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ProfileParams>,
) -> Result<Response, GatewayError> {
    let user_id = params
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("userId query param is required".to_string()))?;

    let config = state.config();
    let credential = auth::bearer(&headers);

    let detail_path = format!("/patients/patients/{user_id}/");
    let detail = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &detail_path)
                .authorization(credential.clone()),
        )
        .await?;

    if detail.status() != StatusCode::NOT_FOUND {
        return Ok(relay(detail));
    }

    let fallback_path = {
        let mut fallback_query = url::form_urlencoded::Serializer::new(String::new());
        fallback_query.append_pair("userId", &user_id);
        format!("/patients/patient-profile/?{}", fallback_query.finish())
    };
    let profile = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &fallback_path)
                .authorization(credential),
        )
        .await?;
    Ok(relay(profile))
}

async fn consult_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(
                Method::POST,
                &config.upstream.base_url,
                "/patients/consultations/",
            )
            .authorization(auth::bearer(&headers))
            .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}
