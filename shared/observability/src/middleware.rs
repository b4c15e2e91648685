//! HTTP middleware for request/response logging with trace context.
//!
//! For every request the middleware:
//! - Extracts or generates a trace context and stores it in request extensions
//! - Runs the handler inside an `http_request` span
//! - Logs status and duration (5xx at error, 4xx and slow requests at warn)
//! - Echoes the trace ID back in the `x-trace-id` response header

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::{error, info, span, warn, Instrument, Level};

use crate::trace_context::{TraceContext, TRACE_ID_HEADER};

#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    /// Path suffixes excluded from logging (e.g. "/health")
    pub exclude_paths: Vec<String>,
    pub slow_request_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "tfidf-search".to_string(),
            exclude_paths: vec!["/health".to_string()],
            slow_request_threshold_ms: 1000,
        }
    }
}

impl ObservabilityConfig {
    pub fn for_service(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Default::default()
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| path.ends_with(p.as_str()))
    }
}

#[derive(Clone)]
pub struct ObservabilityMiddleware {
    config: ObservabilityConfig,
}

impl ObservabilityMiddleware {
    pub fn new(config: ObservabilityConfig) -> Self {
        Self { config }
    }

    pub fn for_service(name: impl Into<String>) -> Self {
        Self::new(ObservabilityConfig::for_service(name))
    }
}

impl<S, B> Transform<S, ServiceRequest> for ObservabilityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ObservabilityMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ObservabilityMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct ObservabilityMiddlewareService<S> {
    service: Rc<S>,
    config: ObservabilityConfig,
}

impl<S, B> Service<ServiceRequest> for ObservabilityMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let config = self.config.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let path = req.path().to_string();
            let method = req.method().to_string();

            let trace_ctx = TraceContext::from_request(req.request());
            req.extensions_mut().insert(trace_ctx.clone());

            let request_span = span!(
                Level::INFO,
                "http_request",
                trace_id = %trace_ctx.trace_id,
                span_id = %trace_ctx.span_id,
                method = %method,
                path = %path,
                service = %config.service_name,
            );

            let start = Instant::now();
            let result = service.call(req).instrument(request_span).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let mut res = match result {
                Ok(res) => res,
                Err(e) => {
                    error!(
                        trace_id = %trace_ctx.trace_id,
                        duration_ms = duration_ms,
                        error = %e,
                        "← {} {} ERROR {}ms",
                        method, path, duration_ms
                    );
                    return Err(e);
                }
            };

            if let Ok(value) = HeaderValue::from_str(&trace_ctx.trace_id) {
                res.headers_mut()
                    .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
            }

            if config.is_excluded(&path) {
                return Ok(res);
            }

            let status_code = res.status().as_u16();
            if status_code >= 500 {
                error!(
                    trace_id = %trace_ctx.trace_id,
                    status = status_code,
                    duration_ms = duration_ms,
                    "← {} {} {} {}ms",
                    method, path, status_code, duration_ms
                );
            } else if status_code >= 400 {
                warn!(
                    trace_id = %trace_ctx.trace_id,
                    status = status_code,
                    duration_ms = duration_ms,
                    "← {} {} {} {}ms",
                    method, path, status_code, duration_ms
                );
            } else if duration_ms > config.slow_request_threshold_ms {
                warn!(
                    trace_id = %trace_ctx.trace_id,
                    status = status_code,
                    duration_ms = duration_ms,
                    "← SLOW {} {} {} {}ms",
                    method, path, status_code, duration_ms
                );
            } else {
                info!(
                    trace_id = %trace_ctx.trace_id,
                    status = status_code,
                    duration_ms = duration_ms,
                    "← {} {} {} {}ms",
                    method, path, status_code, duration_ms
                );
            }

            Ok(res)
        })
    }
}

/// Helper to create observability middleware for a service
pub fn observability(service_name: impl Into<String>) -> ObservabilityMiddleware {
    ObservabilityMiddleware::for_service(service_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace_context::TraceContextExt;
    use actix_web::{test as actix_test, web, App, HttpRequest, HttpResponse};

    async fn echo_trace(req: HttpRequest) -> HttpResponse {
        HttpResponse::Ok().body(req.trace_context().trace_id)
    }

    #[actix_web::test]
    async fn test_trace_id_propagates_to_handler_and_response() {
        let app = actix_test::init_service(
            App::new()
                .wrap(observability("test"))
                .route("/echo", web::get().to(echo_trace)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/echo")
            .insert_header((TRACE_ID_HEADER, "abc-123"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(
            res.headers().get(TRACE_ID_HEADER).unwrap().to_str().unwrap(),
            "abc-123"
        );
        let body = actix_test::read_body(res).await;
        assert_eq!(body, "abc-123");
    }

    #[test]
    fn test_excluded_paths_match_suffix() {
        let config = ObservabilityConfig::for_service("test");
        assert!(config.is_excluded("/api/health"));
        assert!(config.is_excluded("/health"));
        assert!(!config.is_excluded("/search"));
    }
}
