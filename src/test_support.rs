//! Shared test helpers: a recording mock upstream and state wired to it

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::{AppState, Config};

/// Canned response served for every request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// What the mock upstream received
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path_and_query: String,
    pub host: Option<String>,
    pub accept: Option<String>,
    pub custom: Option<String>,
    pub body: Bytes,
}

pub struct MockUpstream {
    addr: SocketAddr,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    handle: JoinHandle<()>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}/java-metadata/metadata/", self.addr)
    }

    pub fn authority(&self) -> String {
        self.addr.to_string()
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn mock_upstream(response: MockResponse) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    let handle = tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let io = TokioIo::new(stream);
            let seen = Arc::clone(&seen_clone);
            let response = response.clone();
            let service = service_fn(move |req| {
                let seen = Arc::clone(&seen);
                let response = response.clone();
                async move { respond(req, &seen, &response).await }
            });

            tokio::spawn(async move {
                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    eprintln!("Mock upstream connection error: {e}");
                }
            });
        }
    });

    MockUpstream { addr, seen, handle }
}

/// Upstream that answers every connection with `raw` verbatim, so tests can
/// control the status line byte for byte. Requests are not recorded.
pub async fn raw_upstream(raw: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream.write_all(raw.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    MockUpstream {
        addr,
        seen: Arc::new(Mutex::new(Vec::new())),
        handle,
    }
}

async fn respond(
    req: Request<Incoming>,
    seen: &Mutex<Vec<SeenRequest>>,
    response: &MockResponse,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };
    let mut record = SeenRequest {
        method: req.method().clone(),
        path_and_query: req
            .uri()
            .path_and_query()
            .map(ToString::to_string)
            .unwrap_or_default(),
        host: header("host"),
        accept: header("accept"),
        custom: header("x-custom"),
        body: Bytes::new(),
    };
    record.body = req.into_body().collect().await.map(|b| b.to_bytes()).unwrap_or_default();
    seen.lock().unwrap().push(record);

    let mut builder = Response::builder()
        .status(response.status)
        .header("Content-Type", response.content_type);
    for (name, value) in &response.headers {
        builder = builder.header(*name, *value);
    }
    Ok(builder
        .body(Full::new(Bytes::from(response.body.clone())))
        .unwrap())
}

/// Base URL of a port nobody listens on
pub fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/java-metadata/metadata/")
}

pub fn test_state(upstream_base_url: &str) -> Arc<AppState> {
    let mut cfg = Config::load_from("does-not-exist/metadata-proxy").unwrap();
    cfg.upstream.base_url = upstream_base_url.to_string();
    cfg.logging.access_log = false;
    Arc::new(AppState::new(&cfg).unwrap())
}
