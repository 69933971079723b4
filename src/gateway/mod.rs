//! Backend forwarding core.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → auth.rs (per-route credential policy)
//!     → query.rs (upstream query construction)
//!     → upstream.rs (one upstream call, no retries)
//!     → relay (status + body verbatim, or buffered binary)
//! ```
//!
//! # Design Decisions
//! - Stateless between requests; nothing here outlives one call
//! - Binary vs JSON is declared per route, never sniffed from content-type
//! - Upstream non-2xx responses are relayed, not treated as local errors

pub mod auth;
pub mod error;
pub mod query;
pub mod upstream;

pub use error::GatewayError;
pub use upstream::UpstreamClient;
