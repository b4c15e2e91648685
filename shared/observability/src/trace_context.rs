//! Trace context extraction from incoming requests.
//!
//! Supports the W3C `traceparent` header and a plain `x-trace-id` header.

use actix_web::{HttpMessage, HttpRequest};
use std::fmt;
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "x-trace-id";
pub const W3C_TRACEPARENT_HEADER: &str = "traceparent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// Shared by every span of the caller's trace
    pub trace_id: String,
    /// This service's span
    pub span_id: String,
    pub parent_span_id: Option<String>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: generate_span_id(),
            parent_span_id: None,
        }
    }

    /// Extract trace context from HTTP request headers, generating fresh IDs if none are present
    pub fn from_request(req: &HttpRequest) -> Self {
        let headers = req.headers();

        if let Some(ctx) = headers
            .get(W3C_TRACEPARENT_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(Self::parse_traceparent)
        {
            return ctx;
        }

        match headers
            .get(TRACE_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|v| !v.is_empty())
        {
            Some(trace_id) => Self {
                trace_id: trace_id.to_string(),
                span_id: generate_span_id(),
                parent_span_id: None,
            },
            None => Self::new(),
        }
    }

    /// Format: version-trace_id-parent_id-flags (e.g. "00-abc-def-01")
    fn parse_traceparent(value: &str) -> Option<Self> {
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() < 3 || parts[1].is_empty() || parts[2].is_empty() {
            return None;
        }
        Some(Self {
            trace_id: parts[1].to_string(),
            span_id: generate_span_id(),
            parent_span_id: Some(parts[2].to_string()),
        })
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trace_id={} span_id={}", self.trace_id, self.span_id)
    }
}

fn generate_span_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// Extension trait to read the TraceContext stored by the middleware
pub trait TraceContextExt {
    fn trace_context(&self) -> TraceContext;
}

impl TraceContextExt for HttpRequest {
    fn trace_context(&self) -> TraceContext {
        if let Some(ctx) = self.extensions().get::<TraceContext>() {
            return ctx.clone();
        }
        TraceContext::from_request(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_new_trace_context() {
        let ctx = TraceContext::new();
        assert_eq!(ctx.trace_id.len(), 32);
        assert_eq!(ctx.span_id.len(), 16);
        assert!(ctx.parent_span_id.is_none());
    }

    #[test]
    fn test_parse_traceparent() {
        let ctx = TraceContext::parse_traceparent("00-abc123-def456-01").unwrap();
        assert_eq!(ctx.trace_id, "abc123");
        assert_eq!(ctx.parent_span_id, Some("def456".to_string()));
        assert!(TraceContext::parse_traceparent("garbage").is_none());
    }

    #[test]
    fn test_from_request_prefers_traceparent() {
        let req = TestRequest::default()
            .insert_header((W3C_TRACEPARENT_HEADER, "00-aaaa-bbbb-01"))
            .insert_header((TRACE_ID_HEADER, "ignored"))
            .to_http_request();

        assert_eq!(TraceContext::from_request(&req).trace_id, "aaaa");
    }

    #[test]
    fn test_from_request_uses_trace_id_header() {
        let req = TestRequest::default()
            .insert_header((TRACE_ID_HEADER, "caller-trace"))
            .to_http_request();

        let ctx = TraceContext::from_request(&req);
        assert_eq!(ctx.trace_id, "caller-trace");
        assert!(ctx.parent_span_id.is_none());
    }
}
