//! Upstream HTTP client
//!
//! One pooled hyper client (HTTPS via rustls, plain HTTP allowed) shared by
//! every request.

use std::error::Error as StdError;
use std::time::Duration;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::header::{ACCEPT, HOST};
use hyper::{Method, Request, Response, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Request body type sent upstream
type UpstreamBody = UnsyncBoxBody<Bytes, BoxError>;

/// Upstream client failure
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid upstream URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),
    #[error("failed to build upstream request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("upstream request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read upstream body: {0}")]
    Body(#[from] hyper::Error),
}

impl ClientError {
    /// Error text including every underlying cause
    pub fn describe(&self) -> String {
        let mut text = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !text.ends_with(&cause_text) {
                text.push_str(": ");
                text.push_str(&cause_text);
            }
            source = cause.source();
        }
        text
    }
}

#[derive(Clone)]
pub struct UpstreamClient {
    inner: Client<HttpsConnector<HttpConnector>, UpstreamBody>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Self {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        let inner = Client::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(https);

        Self { inner }
    }

    /// Send `req` to `upstream_url`, keeping method, headers and body.
    ///
    /// The inbound `Host` is dropped so the client derives it from the
    /// upstream authority.
    pub async fn forward<B>(
        &self,
        req: Request<B>,
        upstream_url: &Url,
    ) -> Result<Response<Incoming>, ClientError>
    where
        B: hyper::body::Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let (mut parts, body) = req.into_parts();
        parts.uri = to_uri(upstream_url)?;
        parts.headers.remove(HOST);

        let body: UpstreamBody = body.map_err(Into::into).boxed_unsync();
        Ok(self.inner.request(Request::from_parts(parts, body)).await?)
    }

    /// GET a JSON document
    pub async fn get_json(&self, url: &Url) -> Result<Response<Incoming>, ClientError> {
        let body: UpstreamBody = Empty::<Bytes>::new().map_err(Into::into).boxed_unsync();
        let req = Request::builder()
            .method(Method::GET)
            .uri(to_uri(url)?)
            .header(ACCEPT, "application/json")
            .body(body)?;

        Ok(self.inner.request(req).await?)
    }
}

/// Fragments never go on the wire
fn to_uri(url: &Url) -> Result<Uri, ClientError> {
    let mut url = url.clone();
    url.set_fragment(None);
    Ok(url.as_str().parse::<Uri>()?)
}
