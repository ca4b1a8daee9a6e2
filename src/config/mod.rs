// Configuration module entry point
// Loads layered configuration and holds the per-process shared state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{Config, HealthConfig, UpstreamConfig};

/// Upstream location every `/metadata/` path is mapped onto by default
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://joschi.github.io/java-metadata/metadata/";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Missing files are fine, defaults and `METADATA_PROXY__*` env vars still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("METADATA_PROXY").separator("__"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("upstream.base_url", DEFAULT_UPSTREAM_BASE_URL)?
            .set_default("upstream.pool_idle_timeout_secs", 90)?
            .set_default("upstream.pool_max_idle_per_host", 32)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/metadata-proxy").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.upstream.base_url, DEFAULT_UPSTREAM_BASE_URL);
        assert_eq!(cfg.upstream.pool_max_idle_per_host, 32);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.health.enabled);
        assert_eq!(cfg.health.liveness_path, "/healthz");
        assert!(cfg.performance.max_connections.is_none());
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("does-not-exist/metadata-proxy").unwrap();
        cfg.server.host = "0.0.0.0".to_string();
        cfg.server.port = 9000;
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 9000);

        cfg.server.host = "not an ip".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
