//! Pharmacy drug-category and report routes.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::{HeaderValue, CONTENT_DISPOSITION};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::upstream::{binary_response, relay, relay_buffered, UpstreamRequest};
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/pharmacy/drug-categories",
            get(list_categories)
                .post(create_category)
                .patch(edit_category)
                .delete(delete_category),
        )
        .route("/pharmacy/print-pharmacy-report", get(print_report))
}

async fn list_categories(
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
                "/pharmacy/drug-categories/",
            )
            .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

async fn create_category(
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
                "/pharmacy/drug-categories/",
            )
            .authorization(Some(credential))
            .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

#[derive(Debug, Deserialize)]
struct CategoryParams {
    id: Option<String>,
}

impl CategoryParams {
    fn id(self) -> Result<String, GatewayError> {
        self.id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::BadRequest("id query param is required".to_string()))
    }
}

async fn edit_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CategoryParams>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let id = params.id()?;
    let config = state.config();
    let path = format!("/pharmacy/drug-categories/{id}/");
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

async fn delete_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CategoryParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let id = params.id()?;
    let config = state.config();
    let path = format!("/pharmacy/drug-categories/{id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::DELETE, &config.upstream.base_url, &path)
                .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

#[derive(Debug, Deserialize)]
struct ReportParams {
    #[serde(rename = "type")]
    report_type: Option<String>,
}

/// Pharmacy report PDF. The upstream may name the file itself; its
/// `Content-Disposition` wins over the local default.
async fn print_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReportParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();

    let path = {
        let mut report_query = url::form_urlencoded::Serializer::new(String::new());
        report_query.append_pair("type", params.report_type.as_deref().unwrap_or(""));
        format!("/pharmacy/reports/?{}", report_query.finish())
    };

    let reply = state
        .client
        .send_buffered(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                .authorization(Some(credential)),
            config.limits.max_download_bytes,
        )
        .await?;

    if !reply.status.is_success() {
        return Ok(relay_buffered(reply));
    }

    let disposition = reply
        .headers
        .get(CONTENT_DISPOSITION)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("inline; filename=\"report.pdf\""));
    Ok(binary_response("application/pdf", Some(disposition), reply.bytes))
}
