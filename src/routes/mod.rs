//! Forwarding route catalog, grouped by upstream resource family.
//!
//! Every handler follows the same contract: method allow-list (enforced by
//! the router), per-route auth policy, one upstream call, relay. Handlers
//! only declare route data — paths, recognized query parameters, relay
//! mode — and lean on the gateway module for the mechanics.

pub mod billing;
pub mod groups;
pub mod inpatient;
pub mod inventory;
pub mod laboratory;
pub mod patients;
pub mod pdf;
pub mod pharmacy;
pub mod register;
pub mod triage;

use axum::Router;
use serde_json::Value;

use crate::http::server::AppState;

/// Assemble every `/api/...` route family.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(patients::router())
        .merge(triage::router())
        .merge(billing::router())
        .merge(inventory::router())
        .merge(laboratory::router())
        .merge(pharmacy::router())
        .merge(inpatient::router())
        .merge(pdf::router())
        .merge(groups::router())
        .merge(register::router())
}

/// Extract an id-like field from a JSON body, tolerating both string and
/// numeric encodings (the browser app sends either).
pub(crate) fn body_id(body: &Value, key: &str) -> Option<String> {
    match body.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
