use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api: ApiTargetConfig,
    pub protocol: ProtocolConfig,
    pub log_level: String,
}

/// Where the REST service lives and how long the gateway waits for it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiTargetConfig {
    pub base_url: String,
    pub path_prefix: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolConfig {
    pub protocol_version: String,
    pub server_name: String,
    pub server_version: String,
}

impl Default for ApiTargetConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4000".to_string(),
            path_prefix: "/v1".to_string(),
            auth_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            protocol_version: "2024-11-05".to_string(),
            server_name: "devplan".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api: ApiTargetConfig::default(),
            protocol: ProtocolConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Defaults, optional TOML file, then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("DEVPLAN_GATEWAY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("DEVPLAN_API_URL") {
            config.api.base_url = url;
        }
        if let Ok(token) = std::env::var("DEVPLAN_API_TOKEN") {
            if !token.is_empty() {
                config.api.auth_token = Some(token);
            }
        }
        if let Ok(timeout) = std::env::var("DEVPLAN_GATEWAY_TIMEOUT_SECS") {
            config.api.request_timeout_secs = timeout.parse()?;
        }
        if let Ok(level) = std::env::var("DEVPLAN_GATEWAY_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.api.path_prefix, "/v1");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.protocol.server_name, "devplan");
    }

    #[test]
    fn test_partial_toml() {
        let config: GatewayConfig =
            toml::from_str("[api]\nbase_url = \"http://10.0.0.5:9999\"").unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:9999");
        assert_eq!(config.api.request_timeout_secs, 30);
    }
}
