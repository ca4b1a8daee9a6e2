//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health checks, upstream mapping,
//! and the choice between plain pass-through and direct resolution.

use crate::config::{AppState, HealthConfig};
use crate::http::{self, ProxyBody};
use crate::logger::{self, AccessLogEntry};
use crate::proxy::{self, BoxError, ResolveError};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HOST, REFERER, USER_AGENT};
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<ProxyBody>, Infallible>
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let entry = state
        .access_log()
        .then(|| start_access_entry(&req, peer_addr));

    let (response, upstream_url) = route_request(req, &state).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        entry.upstream_url = upstream_url.map(String::from);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request, returning the response and the upstream URL it was mapped to
async fn route_request<B>(req: Request<B>, state: &AppState) -> (Response<ProxyBody>, Option<Url>)
where
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);

    // Health check endpoints (highest priority, never proxied)
    if let Some(resp) = check_health(&path, &state.config.health) {
        return (resp, None);
    }

    let request_url = inbound_url(&req);
    let Some(upstream_url) =
        proxy::build_upstream_url(&state.upstream_base, &path, query.as_deref(), None)
    else {
        let err = ResolveError::MissingMarker { path };
        return (unresolved(&err, &request_url, None), None);
    };

    if proxy::is_direct_request(&path, query.as_deref()) {
        let json_url = proxy::strip_direct_param(&upstream_url);
        let response = match proxy::resolve_direct(&state.client, &json_url).await {
            Ok(found) => {
                logger::log_redirect(&request_url, &found.url, &found.json_path);
                http::build_direct_redirect_response(&found.url)
            }
            Err(err) => unresolved(&err, &request_url, Some(&json_url)),
        };
        return (response, Some(json_url));
    }

    let response = match state.client.forward(req, &upstream_url).await {
        Ok(upstream) => http::from_upstream(upstream),
        Err(err) => {
            logger::log_proxy_error(upstream_url.as_str(), &err.describe());
            http::build_502_response()
        }
    };
    (response, Some(upstream_url))
}

fn check_health(path: &str, health: &HealthConfig) -> Option<Response<ProxyBody>> {
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return Some(http::build_health_response("ok"));
    }
    None
}

/// Turn a resolution failure into a diagnostic 404
fn unresolved(
    err: &ResolveError,
    request_url: &str,
    upstream_url: Option<&Url>,
) -> Response<ProxyBody> {
    logger::log_unresolved(request_url, err);
    http::build_diagnostic_response(&err.to_string(), &err.context(request_url, upstream_url))
}

/// Absolute form of the inbound request URL, for diagnostics
fn inbound_url<B>(req: &Request<B>) -> String {
    let host = req
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().authority().map(hyper::http::uri::Authority::as_str))
        .unwrap_or("localhost");
    let path_and_query = req
        .uri()
        .path_and_query()
        .map_or("/", hyper::http::uri::PathAndQuery::as_str);
    format!("http://{host}{path_and_query}")
}

fn start_access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
    .to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}
