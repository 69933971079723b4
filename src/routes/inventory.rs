//! Inventory and procurement routes, including the Excel import/export
//! pair and supplier payment receipts.

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Query, RawQuery, State};
use axum::http::header::{HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::gateway::auth;
use crate::gateway::error::GatewayError;
use crate::gateway::query;
use crate::gateway::upstream::{binary_response, relay, relay_buffered, UpstreamRequest};
use crate::http::server::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory/fetch-inventory", get(fetch_inventory))
        .route("/inventory/units", get(units))
        .route("/inventory/export-items", get(export_items))
        .route(
            "/inventory/import-items",
            post(import_items).layer(DefaultBodyLimit::disable()),
        )
        .route("/inventory/low-drugs", get(low_drugs))
        .route(
            "/inventory/allocate-supplier-payment",
            get(allocate_supplier_payment).post(allocate_supplier_payment),
        )
        // Historically a catch-all; trailing segments are accepted and
        // ignored, the query string carries the routing.
        .route(
            "/inventory/supplier-payment-receipts",
            get(supplier_payment_receipts),
        )
        .route(
            "/inventory/supplier-payment-receipts/{*rest}",
            get(supplier_payment_receipts),
        )
}

#[derive(Debug, Deserialize)]
struct InventoryParams {
    department_name: Option<String>,
    item: Option<String>,
    search_field: Option<String>,
    search_value: Option<String>,
}

async fn fetch_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<InventoryParams>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let path = format!(
        "/inventory/inventories/{}",
        query::inventory_query(
            params.department_name.as_deref(),
            params.item.as_deref(),
            params.search_field.as_deref(),
            params.search_value.as_deref(),
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

async fn units(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let path = format!("/inventory/units/{}", query::passthrough(raw.as_deref()));
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                .authorization(auth::bearer(&headers)),
        )
        .await?;
    Ok(relay(reply))
}

async fn export_items(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send_buffered(
            UpstreamRequest::new(
                Method::GET,
                &config.upstream.base_url,
                "/inventory/items/export_excel/",
            )
            .authorization(Some(credential)),
            config.limits.max_download_bytes,
        )
        .await?;

    if !reply.status.is_success() {
        return Ok(relay_buffered(reply));
    }

    Ok(binary_response(
        XLSX_MIME,
        Some(HeaderValue::from_static("attachment; filename=\"items.xlsx\"")),
        reply.bytes,
    ))
}

/// Spreadsheet uploads stream through untouched so multipart boundaries
/// survive; the inbound framing headers are forwarded as-is.
async fn import_items(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(request.headers())?;
    let content_type = request.headers().get(CONTENT_TYPE).cloned();
    let content_length = request.headers().get(CONTENT_LENGTH).cloned();

    let config = state.config();
    let reply = state
        .client
        .send(
            UpstreamRequest::new(
                Method::POST,
                &config.upstream.base_url,
                "/inventory/items/import_excel/",
            )
            .authorization(Some(credential))
            .raw_body(request.into_body(), content_type, content_length),
        )
        .await?;
    Ok(relay(reply))
}

/// Low-quantity drug report. Rendered by the upstream as a PDF; no
/// disposition header is set, matching the historical behavior.
async fn low_drugs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let credential = auth::require_bearer(&headers)?;
    let config = state.config();
    let reply = state
        .client
        .send_buffered(
            UpstreamRequest::new(
                Method::GET,
                &config.upstream.base_url,
                "/inventory/inventory_filter/?category=Drug&filter_type=low_quantity",
            )
            .authorization(Some(credential)),
            config.limits.max_download_bytes,
        )
        .await?;

    if !reply.status.is_success() {
        return Ok(relay_buffered(reply));
    }

    Ok(binary_response("application/pdf", None, reply.bytes))
}

async fn allocate_supplier_payment(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let mut request = UpstreamRequest::new(
        method.clone(),
        &config.upstream.base_url,
        "/inventory/allocate-supplier-payment/",
    )
    .authorization(auth::bearer(&headers));
    if method != Method::GET {
        request = request.json_body(body);
    }

    let reply = state.client.send(request).await?;
    Ok(relay(reply))
}

#[derive(Debug, Deserialize)]
struct SupplierReceiptParams {
    #[serde(rename = "receiptId")]
    receipt_id: Option<String>,
    action: Option<String>,
}

/// One route, three shapes: listing with verbatim filters, detail by
/// receipt id, and a printable PDF when `action=print`.
async fn supplier_payment_receipts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SupplierReceiptParams>,
    RawQuery(raw): RawQuery,
) -> Result<Response, GatewayError> {
    let config = state.config();
    let credential = auth::bearer(&headers);

    let Some(receipt_id) = params.receipt_id.filter(|id| !id.is_empty()) else {
        let path = format!(
            "/inventory/supplier-payment-receipts/{}",
            query::passthrough_excluding(raw.as_deref(), &["receiptId", "action"])
        );
        let reply = state
            .client
            .send(
                UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                    .authorization(credential),
            )
            .await?;
        return Ok(relay(reply));
    };

    if params.action.as_deref() == Some("print") {
        let path = format!("/inventory/supplier-payment-receipts/{receipt_id}/print/");
        let reply = state
            .client
            .send_buffered(
                UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                    .authorization(credential),
                config.limits.max_download_bytes,
            )
            .await?;

        if !reply.status.is_success() {
            return Ok(relay_buffered(reply));
        }

        let disposition = HeaderValue::from_str(&format!(
            "attachment; filename=\"supplier_payment_receipt_{receipt_id}.pdf\""
        ))
        .map_err(|_| {
            GatewayError::BadRequest("receiptId contains invalid characters".to_string())
        })?;
        return Ok(binary_response("application/pdf", Some(disposition), reply.bytes));
    }

    let path = format!("/inventory/supplier-payment-receipts/{receipt_id}/");
    let reply = state
        .client
        .send(
            UpstreamRequest::new(Method::GET, &config.upstream.base_url, &path)
                .authorization(credential),
        )
        .await?;
    Ok(relay(reply))
}
