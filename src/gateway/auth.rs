//! Authorization propagation.
//!
//! The gateway never validates the bearer token; it only decides whether a
//! missing one is rejected locally or left for the upstream to judge.

use axum::http::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::gateway::error::GatewayError;

/// The inbound `Authorization` header, verbatim. Used by the routes that
/// historically forward unauthenticated requests and let the upstream
/// enforce access (patient, inpatient scheduling, and a few billing and
/// inventory routes).
pub fn bearer(headers: &HeaderMap) -> Option<HeaderValue> {
    headers.get(AUTHORIZATION).cloned()
}

/// The credential, or a local 401 before any upstream contact. Used by
/// every other route. Whether the split between the two policies is
/// intentional is an open product question; the route modules are the
/// source of truth for which routes enforce.
pub fn require_bearer(headers: &HeaderMap) -> Result<HeaderValue, GatewayError> {
    bearer(headers).ok_or(GatewayError::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_is_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            require_bearer(&headers),
            Err(GatewayError::Unauthenticated)
        ));
    }

    #[test]
    fn credential_is_forwarded_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        let credential = require_bearer(&headers).unwrap();
        assert_eq!(credential, HeaderValue::from_static("Bearer abc123"));
    }

    #[test]
    fn passthrough_tolerates_absence() {
        let headers = HeaderMap::new();
        assert!(bearer(&headers).is_none());
    }
}
