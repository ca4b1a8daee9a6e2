// Application state module
// Immutable per-process state shared by every request

use url::Url;

use super::types::Config;
use crate::proxy::UpstreamClient;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Validated upstream base, fixed for the lifetime of the process
    pub upstream_base: Url,
    pub client: UpstreamClient,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, String> {
        let upstream_base = parse_upstream_base(&config.upstream.base_url)?;
        let client = UpstreamClient::new(&config.upstream);

        Ok(Self {
            config: config.clone(),
            upstream_base,
            client,
        })
    }

    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}

/// Validate the configured upstream base URL
fn parse_upstream_base(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("Invalid upstream base URL '{raw}': {e}"))?;

    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(format!(
            "Upstream base URL '{raw}' must be an absolute http(s) URL"
        ));
    }
    if !url.path().ends_with('/') {
        return Err(format!("Upstream base URL path '{}' must end with '/'", url.path()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(format!(
            "Upstream base URL '{raw}' must not carry a query or fragment"
        ));
    }

    Ok(url)
}
