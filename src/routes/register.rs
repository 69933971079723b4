//! Password reset confirmation route.
//!
//! Reached from the email reset link, so no credential exists yet; nothing
//! is forwarded in the `Authorization` header either way.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::Method;
use axum::response::Response;
use axum::routing::post;
use axum::Router;

use crate::gateway::error::GatewayError;
use crate::gateway::upstream::{relay, UpstreamRequest};
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/register/change-password/{uidb64}/{token}",
        post(change_password),
    )
}

async fn change_password(
    State(state): State<AppState>,
    Path((uidb64, token)): Path<(String, String)>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let path = format!("/customuser/password-reset/confirm/{uidb64}/{token}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::POST, &config.upstream.base_url, &path).json_body(body),
        )
        .await?;
    Ok(relay(reply))
}
