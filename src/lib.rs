//! EasyMed backend forwarding gateway.
//!
//! The thin API layer between the hospital management browser application
//! and the upstream REST backend. Every `/api/...` route is forwarded 1:1
//! to the corresponding upstream operation: the bearer credential is
//! propagated verbatim, JSON bodies pass through untouched, and the PDF and
//! spreadsheet routes relay raw byte buffers with the right media headers.
//! The gateway is stateless between requests.

pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routes;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
