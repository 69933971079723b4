//! Shared utilities for integration tests: a programmable mock upstream
//! and a gateway spawner.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use easymed_gateway::config::GatewayConfig;
use easymed_gateway::http::HttpServer;
use easymed_gateway::lifecycle::Shutdown;

/// A response the mock upstream will serve.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// One request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub method: String,
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug)]
struct MockInner {
    queued: VecDeque<CannedResponse>,
    fallback: CannedResponse,
    received: Vec<ReceivedRequest>,
}

/// A mock upstream backend: serves queued responses in order (falling back
/// to a default), and records every request it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    inner: Arc<Mutex<MockInner>>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(MockInner {
            queued: VecDeque::new(),
            fallback: CannedResponse::json(200, r#"{"ok":true}"#),
            received: Vec::new(),
        }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = Router::new()
            .fallback(capture)
            .with_state(inner.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, inner }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Set the default response served when nothing is queued.
    pub fn respond_with(&self, response: CannedResponse) {
        self.inner.lock().unwrap().fallback = response;
    }

    /// Queue a one-shot response, served before the default.
    pub fn enqueue(&self, response: CannedResponse) {
        self.inner.lock().unwrap().queued.push_back(response);
    }

    /// Every request received so far, in order.
    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.inner.lock().unwrap().received.clone()
    }
}

async fn capture(
    State(inner): State<Arc<Mutex<MockInner>>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    let canned = {
        let mut guard = inner.lock().unwrap();
        guard.received.push(ReceivedRequest {
            method: parts.method.to_string(),
            path_and_query,
            authorization: header("authorization"),
            content_type: header("content-type"),
            body: bytes.to_vec(),
        });
        guard.queued.pop_front().unwrap_or_else(|| guard.fallback.clone())
    };

    let mut builder = Response::builder().status(canned.status);
    for (name, value) in &canned.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(canned.body)).unwrap()
}

/// A gateway instance running against the given upstream origin.
pub struct TestGateway {
    pub addr: SocketAddr,
    // Held so the server does not observe an early shutdown/reload close.
    _shutdown: Shutdown,
    _config_updates: mpsc::UnboundedSender<GatewayConfig>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Spawn a gateway bound to an ephemeral port, forwarding to `upstream_base`.
pub async fn spawn_gateway(upstream_base: &str) -> TestGateway {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream_base.to_string();
    config.timeouts.connect_secs = 2;
    config.timeouts.upstream_secs = 5;
    config.timeouts.request_secs = 10;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config);
    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // Give the accept loop a beat to come up.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestGateway {
        addr,
        _shutdown: shutdown,
        _config_updates: updates_tx,
    }
}

/// A reqwest client that never routes through a proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
