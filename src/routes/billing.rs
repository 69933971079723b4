//! Billing and accounts-receivable routes.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, RawQuery, State};
use axum::http::header::HeaderValue;
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::query;
use crate::gateway::upstream::{binary_response, relay, relay_buffered, UpstreamRequest};
use crate::http::server::AppState;

/// Payment allocations are small JSON documents; the generous global body
/// limit does not apply here.
const ALLOCATE_PAYMENT_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/billing/fetch-invoices",
            get(fetch_invoices).post(create_invoice),
        )
        .route("/billing/payment-receipts", get(payment_receipts))
        .route("/billing/payment-receipt", get(payment_receipt_pdf))
        .route(
            "/billing/allocate-payment",
            post(allocate_payment).layer(DefaultBodyLimit::max(ALLOCATE_PAYMENT_BODY_LIMIT)),
        )
}

#[derive(Debug, Deserialize)]
struct InvoiceParams {
    search_field: Option<String>,
    search_value: Option<String>,
    /// Expected values: "pending" | "paid" | "all".
    status: Option<String>,
}

async fn fetch_invoices(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<InvoiceParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let path = format!(
        "/billing/invoices/{}",
        query::invoices_query(
            params.search_field.as_deref(),
            params.search_value.as_deref(),
            params.status.as_deref(),
        )
    );
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                .authorization(Some(credential)),
        )
        .await?;
    Ok(relay(reply))
}

async fn create_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::POST, &config.upstream.base_url, "/billing/invoices/")
                .authorization(Some(credential))
                .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}

/// Receipt listing forwards the inbound filter query verbatim.
async fn payment_receipts(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let path = format!(
        "/billing/payment-receipts/{}",
        query::passthrough(raw.as_deref())
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

#[derive(Debug, Deserialize)]
struct ReceiptParams {
    id: Option<String>,
}

async fn payment_receipt_pdf(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReceiptParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("id is required".to_string()))?;

    let config = state.config();
    let path = format!("/billing/download_payment_receipt_pdf/{id}/");
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
        HeaderValue::from_str(&format!("inline; filename=payment_receipt_{id}.pdf"))
            .map_err(|_| GatewayError::BadRequest("id contains invalid characters".to_string()))?;
    Ok(binary_response("application/pdf", Some(disposition), reply.bytes))
}

async fn allocate_payment(
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
                "/billing/allocate-payment/",
            )
            .authorization(Some(credential))
            .json_body(body),
        )
        .await?;
    Ok(relay(reply))
}
