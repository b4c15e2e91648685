//! Observability for the TF-IDF search service.
//!
//! # Features
//! - Pretty or JSON structured logging through `tracing-subscriber`
//! - Trace ID extraction from `traceparent` / `x-trace-id` headers
//! - HTTP middleware for request/response logging with slow request detection

pub mod init;
pub mod middleware;
pub mod trace_context;

pub use init::*;
pub use middleware::*;
pub use trace_context::*;

// Re-export tracing for convenience
pub use tracing::{debug, error, info, instrument, warn, Instrument, Level};
