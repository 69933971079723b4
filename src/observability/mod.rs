//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All handlers produce:
//!     → structured log events (tracing, request ID in every span)
//!     → counters and histograms (metrics facade)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through all log lines for one request
//! - Metrics are cheap (atomic increments)

pub mod metrics;
