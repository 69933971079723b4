//! Upstream HTTP client and response relay.
//!
//! # Responsibilities
//! - Build the absolute upstream URI (configured base + fixed path + query)
//! - Attach the inbound `Authorization` credential verbatim
//! - Issue exactly one upstream call per inbound request (no retries)
//! - Classify transport failures separately from structured rejections
//! - Relay structured responses verbatim, streamed or buffered
//!
//! # Design Decisions
//! - An upstream response with *any* status is a success of the transport:
//!   it is relayed as-is. Only "no response at all" becomes a local 500.
//! - Binary routes buffer the whole payload so Content-Type and
//!   Content-Disposition can be applied before a byte is written.
//! - The client holds no base URL; the per-request config snapshot supplies
//!   it, so a hot reload takes effect on the next request.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, Request, Response, StatusCode, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::TimeoutConfig;
use crate::gateway::error::GatewayError;
use crate::observability::metrics;

/// Headers that describe the inbound→upstream hop rather than the payload.
/// They must not survive the relay in either direction.
const HOP_BY_HOP: [HeaderName; 5] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

/// One upstream call, fully described before it is issued.
pub struct UpstreamRequest<'a> {
    pub method: Method,
    /// Origin from the config snapshot, e.g. "http://localhost:8080".
    pub base_url: &'a str,
    /// Fixed upstream path plus encoded query, e.g. "/billing/invoices/?search=".
    pub path_and_query: &'a str,
    /// Inbound credential, forwarded verbatim when present.
    pub authorization: Option<HeaderValue>,
    /// Payload headers to forward (content-type, content-length).
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: Body,
}

impl<'a> UpstreamRequest<'a> {
    pub fn new(method: Method, base_url: &'a str, path_and_query: &'a str) -> Self {
        Self {
            method,
            base_url,
            path_and_query,
            authorization: None,
            headers: Vec::new(),
            body: Body::empty(),
        }
    }

    pub fn authorization(mut self, credential: Option<HeaderValue>) -> Self {
        self.authorization = credential;
        self
    }

    /// Attach a JSON payload, forwarded verbatim.
    pub fn json_body(mut self, bytes: Bytes) -> Self {
        self.headers.push((
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ));
        self.body = Body::from(bytes);
        self
    }

    /// Attach a raw streamed payload with its original framing headers,
    /// preserving multipart boundaries on upload routes.
    pub fn raw_body(
        mut self,
        body: Body,
        content_type: Option<HeaderValue>,
        content_length: Option<HeaderValue>,
    ) -> Self {
        if let Some(value) = content_type {
            self.headers.push((header::CONTENT_TYPE, value));
        }
        if let Some(value) = content_length {
            self.headers.push((header::CONTENT_LENGTH, value));
        }
        self.body = body;
        self
    }
}

/// A fully buffered upstream reply, used by the binary download routes.
pub struct BufferedReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

/// Thin wrapper over the hyper-util legacy client.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Issue the upstream call and hand back whatever structured response
    /// arrives, any status included. Transport-level failures (no response)
    /// become [`GatewayError::UpstreamUnreachable`].
    pub async fn send(
        &self,
        request: UpstreamRequest<'_>,
    ) -> Result<Response<Incoming>, GatewayError> {
        let uri: Uri = format!(
            "{}{}",
            request.base_url.trim_end_matches('/'),
            request.path_and_query
        )
        .parse()
        .map_err(|e| GatewayError::UpstreamUnreachable(format!("invalid upstream URI: {e}")))?;

        tracing::debug!(method = %request.method, uri = %uri, "Forwarding to upstream");

        let mut builder = Request::builder().method(request.method).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            if let Some(credential) = request.authorization {
                headers.insert(header::AUTHORIZATION, credential);
            }
            for (name, value) in request.headers {
                headers.insert(name, value);
            }
        }
        let upstream_request = builder
            .body(request.body)
            .map_err(|e| GatewayError::UpstreamUnreachable(e.to_string()))?;

        match tokio::time::timeout(self.upstream_timeout, self.client.request(upstream_request))
            .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Upstream request failed");
                Err(GatewayError::UpstreamUnreachable(e.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.upstream_timeout.as_secs(),
                    "Upstream request timed out"
                );
                Err(GatewayError::UpstreamUnreachable(format!(
                    "upstream request timed out after {}s",
                    self.upstream_timeout.as_secs()
                )))
            }
        }
    }

    /// Issue the call and buffer the whole reply, for routes that must set
    /// download headers before writing the payload.
    pub async fn send_buffered(
        &self,
        request: UpstreamRequest<'_>,
        limit: usize,
    ) -> Result<BufferedReply, GatewayError> {
        let response = self.send(request).await?;
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), limit)
            .await
            .map_err(|_| GatewayError::DownloadTooLarge)?;

        Ok(BufferedReply {
            status: parts.status,
            headers: parts.headers,
            bytes,
        })
    }
}

/// Relay a streamed upstream reply verbatim: status and body untouched,
/// hop-by-hop headers dropped.
pub fn relay(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    for name in HOP_BY_HOP {
        parts.headers.remove(&name);
    }
    metrics::record_upstream_status(parts.status.as_u16());
    Response::from_parts(parts, Body::new(body))
}

/// Build the outbound response for a successful binary download: the exact
/// upstream byte buffer with the route-declared media headers applied.
pub fn binary_response(
    content_type: &'static str,
    disposition: Option<HeaderValue>,
    bytes: Bytes,
) -> Response<Body> {
    let mut response = Response::new(Body::from(bytes));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    if let Some(disposition) = disposition {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }
    response
}

/// Relay a buffered upstream rejection (non-2xx on a binary route),
/// preserving its status, content-type, and payload.
pub fn relay_buffered(reply: BufferedReply) -> Response<Body> {
    metrics::record_upstream_status(reply.status.as_u16());
    let mut response = Response::new(Body::from(reply.bytes));
    *response.status_mut() = reply.status;
    if let Some(content_type) = reply.headers.get(header::CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }
    response
}
