// Server Configuration
// Defaults, optional TOML file, then environment overrides, in that order.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host for the REST API.
    pub host: String,
    pub port: u16,
    /// `memory:` for the in-process store, or a `postgres://` URL.
    pub store_url: String,
    /// Path prefix every entity route lives under.
    pub api_prefix: String,
    pub log_level: String,
    /// CORS allow-origin; `*` for permissive.
    pub cors_origin: String,
    /// Requests allowed per caller per window; 0 disables limiting.
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    /// Request body cap in bytes.
    pub max_body_bytes: usize,
    /// Budget for the store probe behind the readiness endpoints.
    pub health_timeout_ms: u64,
    /// Lifetime of recorded idempotent responses.
    pub idempotency_ttl_secs: u64,
    pub idempotency_max_entries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            store_url: "memory:".to_string(),
            api_prefix: "/v1".to_string(),
            log_level: "info".to_string(),
            cors_origin: "*".to_string(),
            rate_limit_max: 300,
            rate_limit_window_secs: 60,
            max_body_bytes: 1024 * 1024,
            health_timeout_ms: 2000,
            idempotency_ttl_secs: crate::idempotency::DEFAULT_TTL_SECS,
            idempotency_max_entries: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration: file (when `DEVPLAN_CONFIG` points at one), then
    /// environment variables on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("DEVPLAN_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        if let Ok(host) = std::env::var("DEVPLAN_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("DEVPLAN_PORT") {
            config.port = port.parse()?;
        }
        if let Ok(url) = std::env::var("DEVPLAN_STORE_URL") {
            config.store_url = url;
        }
        if let Ok(level) = std::env::var("DEVPLAN_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(origin) = std::env::var("DEVPLAN_CORS_ORIGIN") {
            config.cors_origin = origin;
        }
        if let Ok(max) = std::env::var("DEVPLAN_RATE_LIMIT_MAX") {
            config.rate_limit_max = max.parse()?;
        }
        if let Ok(window) = std::env::var("DEVPLAN_RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit_window_secs = window.parse()?;
        }

        Ok(config)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.api_prefix, "/v1");
        assert_eq!(config.store_url, "memory:");
        assert_eq!(config.idempotency_ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str("port = 9000\nstore_url = \"postgres://db\"")
            .expect("partial config parses");
        assert_eq!(config.port, 9000);
        assert_eq!(config.store_url, "postgres://db");
        assert_eq!(config.api_prefix, "/v1");
    }
}
