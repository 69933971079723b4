//! Laboratory settings, interpretations, and panel routes.

use axum::body::Bytes;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, put};
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
        .route(
            "/laboratory/lab-settings",
            get(lab_settings).put(update_lab_settings),
        )
        .route(
            "/laboratory/lab-test-interpretations",
            get(list_interpretations)
                .post(create_interpretation)
                .patch(edit_interpretation)
                .put(edit_interpretation)
                .delete(delete_interpretation),
        )
        .route(
            "/laboratory/lab-test-requests-panel/{id}",
            put(update_test_request_panel),
        )
        .route(
            "/laboratory/recent-reagent-usage",
            get(recent_reagent_usage),
        )
}

/// Settings live in a single upstream row; a `get_settings` query flag
/// switches to the custom action endpoint.
async fn lab_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let path = if raw.as_deref().is_some_and(|q| q.contains("get_settings")) {
        "/lab/lab-settings/get_settings/"
    } else {
        "/lab/lab-settings/"
    };
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, path)
                .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

async fn update_lab_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    // Singleton settings row, always id 1 upstream.
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::PUT, &config.upstream.base_url, "/lab/lab-settings/1/")
                .authorization(Some(credential))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

async fn list_interpretations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(
                Method::GET,
                &config.upstream.base_url,
                "/lab/lab-test-interpretations/",
            )
            .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

async fn create_interpretation(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(
                Method::POST,
                &config.upstream.base_url,
                "/lab/lab-test-interpretations/",
            )
            .authorization(Some(credential))
            .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

#[derive(Debug, Deserialize)]
struct InterpretationParams {
    id: Option<String>,
    lab_test_interpretation_id: Option<String>,
}

impl InterpretationParams {
    fn id(&self) -> Option<String> {
        self.id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| self.lab_test_interpretation_id.clone().filter(|id| !id.is_empty()))
    }
}

/// PUT and PATCH both become an upstream PATCH against the detail path.
/// The id is resolved from the query first, then the body.
async fn edit_interpretation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<InterpretationParams>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let id = params
        .id()
        .or_else(|| {
            serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|parsed| body_id(&parsed, "id"))
        })
        .ok_or_else(|| {
            GatewayError::BadRequest("lab test interpretation id is required".to_string())
        })?;

    let config = state.config();
    let path = format!("/lab/lab-test-interpretations/{id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::PATCH, &config.upstream.base_url, &path)
                .authorization(Some(credential))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

async fn delete_interpretation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<InterpretationParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let id = params.id().ok_or_else(|| {
        GatewayError::BadRequest("lab test interpretation id is required".to_string())
    })?;

    let config = state.config();
    let path = format!("/lab/lab-test-interpretations/{id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::DELETE, &config.upstream.base_url, &path)
                .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

async fn update_test_request_panel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let path = format!("/lab/lab-test-requests-panel/{id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::PUT, &config.upstream.base_url, &path)
                .authorization(Some(credential))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

async fn recent_reagent_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(
                Method::GET,
                &config.upstream.base_url,
                "/lab/reagent-consumption/recent_usage/",
            )
            .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}
