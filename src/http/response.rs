//! HTTP response building module
//!
//! Builders for every response the proxy produces on its own, plus the
//! conversion of upstream responses into the server body type.

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Bytes, Incoming};
use hyper::Response;

use crate::proxy::DiagnosticContext;

/// Body type of every response handed back to hyper
pub type ProxyBody = UnsyncBoxBody<Bytes, hyper::Error>;

/// Wrap a complete in-memory body
pub fn full<T: Into<Bytes>>(chunk: T) -> ProxyBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn empty() -> ProxyBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Pass an upstream response through untouched, body streamed
pub fn from_upstream(response: Response<Incoming>) -> Response<ProxyBody> {
    response.map(BodyExt::boxed_unsync)
}

/// Build 404 diagnostic response
pub fn build_diagnostic_response(message: &str, context: &DiagnosticContext) -> Response<ProxyBody> {
    let body = context.render(message);
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(full(body.clone()))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full(body))
        })
}

/// Build 302 redirect to a resolved archive; never cached since upstream data may move
pub fn build_direct_redirect_response(location: &str) -> Response<ProxyBody> {
    Response::builder()
        .status(302)
        .header("Location", location)
        .header("Cache-Control", "no-store")
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            build_502_response()
        })
}

/// Build 502 Bad Gateway response for a failed pass-through
pub fn build_502_response() -> Response<ProxyBody> {
    Response::builder()
        .status(502)
        .header("Content-Type", "text/plain")
        .body(full("502 Bad Gateway"))
        .unwrap_or_else(|e| {
            log_build_error("502", &e);
            Response::new(full("502 Bad Gateway"))
        })
}

/// Build health check response
pub fn build_health_response(status: &'static str) -> Response<ProxyBody> {
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-cache")
        .body(full(status))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(full(status))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_string(response: Response<ProxyBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_diagnostic_response() {
        let ctx = DiagnosticContext::new().with("requestUrl", "http://proxy/a");
        let response = build_diagnostic_response("Nope.", &ctx);
        assert_eq!(response.status(), 404);
        assert_eq!(
            response.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        let body = body_string(response).await;
        assert!(body.starts_with("404 Not Found (metadata proxy)\n\nNope.\n\nContext:\n{\n"));
        assert!(body.ends_with("}\n"));
    }

    #[tokio::test]
    async fn test_redirect_response() {
        let response = build_direct_redirect_response("https://host/file.zip");
        assert_eq!(response.status(), 302);
        assert_eq!(response.headers()["location"], "https://host/file.zip");
        assert_eq!(response.headers()["cache-control"], "no-store");
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_health_response() {
        let response = build_health_response("ok");
        assert_eq!(response.status(), 200);
        assert_eq!(body_string(response).await, "ok");
    }
}
