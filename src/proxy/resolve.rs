//! Direct resolution: fetch a metadata document and pick its first archive

use http_body_util::BodyExt;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::ext::ReasonPhrase;
use hyper::{Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use super::client::{ClientError, UpstreamClient};
use super::diagnostic::DiagnosticContext;
use super::direct_match::{find_direct_match, DirectMatch};
use super::upstream::METADATA_MARKER;

/// Why a request could not be mapped or resolved. The display text is the
/// message shown in the diagnostic body.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Request path does not contain the /metadata/ segment, so it cannot be mapped upstream.")]
    MissingMarker { path: String },

    #[error("Failed to fetch the upstream JSON document.")]
    Unreachable { error: String },

    #[error("Upstream JSON document request did not succeed.")]
    UpstreamStatus {
        status: StatusCode,
        status_text: String,
        content_type: Option<String>,
    },

    #[error("Upstream response could not be parsed as JSON.")]
    MalformedJson {
        content_type: Option<String>,
        error: String,
    },

    #[error("No tar.gz or zip entry with a url field was found in the upstream JSON document.")]
    NoMatch,

    #[error("The matched entry's url is not a valid absolute URL.")]
    InvalidMatchUrl { found: DirectMatch },
}

impl ResolveError {
    /// Diagnostic context for this failure
    pub fn context(&self, request_url: &str, upstream_url: Option<&Url>) -> DiagnosticContext {
        let mut ctx = DiagnosticContext::new().with("requestUrl", request_url);
        if let Some(upstream_url) = upstream_url {
            ctx = ctx.with("upstreamUrl", upstream_url.as_str());
        }

        match self {
            Self::MissingMarker { path } => ctx.with("path", path).with("marker", METADATA_MARKER),
            Self::Unreachable { error } => ctx.with("error", error),
            Self::UpstreamStatus {
                status,
                status_text,
                content_type,
            } => ctx
                .with("upstreamStatus", status.as_u16())
                .with("upstreamStatusText", status_text)
                .with("upstreamContentType", content_type),
            Self::MalformedJson {
                content_type,
                error,
            } => ctx
                .with("upstreamContentType", content_type)
                .with("error", error),
            Self::NoMatch => ctx,
            Self::InvalidMatchUrl { found } => ctx.with("match", found),
        }
    }
}

impl From<ClientError> for ResolveError {
    fn from(err: ClientError) -> Self {
        Self::Unreachable {
            error: err.describe(),
        }
    }
}

/// Fetch the JSON document at `json_url` and return its first archive entry.
///
/// `json_url` must already have the `direct` parameter removed.
pub async fn resolve_direct(
    client: &UpstreamClient,
    json_url: &Url,
) -> Result<DirectMatch, ResolveError> {
    let response = client.get_json(json_url).await?;

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    if !status.is_success() {
        return Err(ResolveError::UpstreamStatus {
            status,
            status_text: reason_phrase(&response),
            content_type,
        });
    }

    let body = response
        .into_body()
        .collect()
        .await
        .map_err(ClientError::from)?
        .to_bytes();

    let document: Value =
        serde_json::from_slice(&body).map_err(|e| ResolveError::MalformedJson {
            content_type,
            error: e.to_string(),
        })?;

    let found = find_direct_match(&document).ok_or(ResolveError::NoMatch)?;
    if !is_absolute_url(&found.url) {
        return Err(ResolveError::InvalidMatchUrl { found });
    }

    Ok(found)
}

/// Reason phrase from the upstream status line. hyper only records it when
/// it differs from the canonical one.
fn reason_phrase<B>(response: &Response<B>) -> String {
    response.extensions().get::<ReasonPhrase>().map_or_else(
        || response.status().canonical_reason().unwrap_or("").to_string(),
        |phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
    )
}

/// Absolute URL with an authority that can be sent as a `Location` value
fn is_absolute_url(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| url.has_host()) && HeaderValue::from_str(raw).is_ok()
}
