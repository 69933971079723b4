//! PDF download and report routes.
//!
//! All of these buffer the upstream payload so the media headers can be
//! applied before the first byte goes out.

use axum::extract::{Query, State};
use axum::http::header::HeaderValue;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::upstream::{binary_response, relay_buffered, UpstreamRequest};
use crate::http::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pdf/download_pdf", get(download_pdf))
        .route("/pdf/result_pdf", get(result_pdf))
        .route("/pdf/lab-report-pdf", get(lab_report_pdf))
}

#[derive(Debug, Deserialize)]
struct DocumentParams {
    item_name: Option<String>,
    item_id: Option<String>,
}

async fn fetch_document(
    state: &AppState,
    headers: &HeaderMap,
    params: DocumentParams,
    family: &str,
    default_name: &str,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(headers)?;
    let item_id = params
        .item_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("item_id query param is required".to_string()))?;
    let item_name = params
        .item_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| default_name.to_string());

    let config = state.config();
    let path = format!("/{family}/{item_name}/{item_id}/");
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

    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{item_name}.pdf\""))
        .map_err(|_| {
            GatewayError::BadRequest("item_name contains invalid characters".to_string())
        })?;
    Ok(binary_response("application/pdf", Some(disposition), reply.bytes))
}

/// Billing documents: invoices, receipts, statements.
async fn download_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DocumentParams>,
) -> Result<Response, GatewayError> {
    fetch_document(&state, &headers, params, "billing", "document").await
}

/// Laboratory result documents.
async fn result_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DocumentParams>,
) -> Result<Response, GatewayError> {
    fetch_document(&state, &headers, params, "lab", "lab_result").await
}

#[derive(Debug, Deserialize)]
struct LabReportParams {
    #[serde(rename = "type")]
    report_type: Option<String>,
}

async fn lab_report_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<LabReportParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let report_type = params.report_type.unwrap_or_default();

    let config = state.config();
    let path = {
        let mut report_query = url::form_urlencoded::Serializer::new(String::new());
        report_query.append_pair("type", &report_type);
        format!("/patients/reports/lab-tests/?{}", report_query.finish())
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

    let disposition =
        HeaderValue::from_str(&format!("inline; filename=\"lab_{report_type}_report.pdf\""))
            .map_err(|_| {
                GatewayError::BadRequest("type contains invalid characters".to_string())
            })?;
    Ok(binary_response("application/pdf", Some(disposition), reply.bytes))
}
