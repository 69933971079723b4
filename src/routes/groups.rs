//! User group and permission administration routes.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{post, put};
use axum::Router;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::upstream::{relay, UpstreamRequest};
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups/create-group", post(create_group))
        .route("/groups/add-permission/{group_id}", put(add_permission))
}

async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::POST, &config.upstream.base_url, "/customuser/groups/")
                .authorization(Some(credential))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

async fn add_permission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(group_id): Path<String>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let path = format!("/customuser/groups/add-permission/{group_id}/");
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
