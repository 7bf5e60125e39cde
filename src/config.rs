//! Server configuration: transport, Dokku connection, plugin discovery,
//! multi-tenancy, and logging. A closed set of sections loaded from YAML with
//! `DOKKU_MCP_<UPPER_DOT_PATH>` environment overrides.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::McpResult;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DokkuMcpConfig {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub dokku: DokkuConfig,

    #[serde(default)]
    pub plugin_discovery: PluginDiscoveryConfig,

    #[serde(default)]
    pub multi_tenant: MultiTenantConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl Default for DokkuMcpConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            dokku: DokkuConfig::default(),
            plugin_discovery: PluginDiscoveryConfig::default(),
            multi_tenant: MultiTenantConfig::default(),
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Sse,
}

impl Default for TransportKind {
    fn default() -> Self {
        Self::Stdio
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(rename = "type", default)]
    pub kind: TransportKind,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            host: default_host(),
            port: default_port(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS policy for the SSE transport. `allowed_origins` entries of the form
/// `*.example.com` match any subdomain; a bare `*` matches every origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_cors_methods")]
    pub allowed_methods: Vec<String>,

    #[serde(default = "default_cors_headers")]
    pub allowed_headers: Vec<String>,

    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: Vec::new(),
            allowed_methods: default_cors_methods(),
            allowed_headers: default_cors_headers(),
            max_age: default_cors_max_age(),
        }
    }
}

impl CorsConfig {
    /// `allow(origin)` per the wildcard/subdomain rule: a bare `*` entry
    /// matches any origin; a `*.domain` entry matches an origin suffixed with
    /// `.domain`; anything else must match the origin exactly.
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| {
            if allowed == "*" {
                true
            } else if let Some(suffix) = allowed.strip_prefix('*') {
                origin.ends_with(suffix)
            } else {
                allowed == origin
            }
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DokkuConfig {
    #[serde(default = "default_dokku_host")]
    pub host: String,

    #[serde(default = "default_dokku_port")]
    pub port: u16,

    #[serde(default = "default_dokku_user")]
    pub user: String,

    #[serde(default = "default_dokku_path")]
    pub path: String,

    #[serde(default)]
    pub ssh_key_path: Option<String>,

    #[serde(with = "humantime_serde", default = "default_dokku_timeout")]
    pub timeout: Duration,
}

impl Default for DokkuConfig {
    fn default() -> Self {
        Self {
            host: default_dokku_host(),
            port: default_dokku_port(),
            user: default_dokku_user(),
            path: default_dokku_path(),
            ssh_key_path: None,
            timeout: default_dokku_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDiscoveryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(with = "humantime_serde", default = "default_sync_interval")]
    pub sync_interval: Duration,
}

impl Default for PluginDiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sync_interval: default_sync_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MultiTenantConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Text
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_cors_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()]
}
fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string()]
}
fn default_cors_max_age() -> u64 {
    3600
}
fn default_dokku_host() -> String {
    "localhost".to_string()
}
fn default_dokku_port() -> u16 {
    22
}
fn default_dokku_user() -> String {
    "dokku".to_string()
}
fn default_dokku_path() -> String {
    "dokku".to_string()
}
fn default_dokku_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_sync_interval() -> Duration {
    Duration::from_secs(60)
}
fn default_true() -> bool {
    true
}

impl DokkuMcpConfig {
    /// Load configuration from a YAML file, applying environment overrides
    /// and validating the result.
    pub async fn from_file(path: &str) -> McpResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| crate::error::McpError::Configuration {
                message: format!("failed to read config file '{path}': {e}"),
            })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| crate::error::McpError::Configuration {
            message: format!("failed to parse config file '{path}': {e}"),
        })?;

        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `DOKKU_MCP_<SECTION>_<FIELD>` overrides, e.g.
    /// `DOKKU_MCP_TRANSPORT_PORT=4000` or `DOKKU_MCP_DOKKU_HOST=prod.example.com`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("DOKKU_MCP_TRANSPORT_HOST") {
            self.transport.host = v;
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_TRANSPORT_PORT") {
            if let Ok(port) = v.parse() {
                self.transport.port = port;
            }
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_TRANSPORT_TYPE") {
            match v.to_lowercase().as_str() {
                "stdio" => self.transport.kind = TransportKind::Stdio,
                "sse" => self.transport.kind = TransportKind::Sse,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_DOKKU_HOST") {
            self.dokku.host = v;
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_DOKKU_PORT") {
            if let Ok(port) = v.parse() {
                self.dokku.port = port;
            }
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_DOKKU_USER") {
            self.dokku.user = v;
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_DOKKU_SSH_KEY_PATH") {
            self.dokku.ssh_key_path = Some(v);
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_MULTI_TENANT_ENABLED") {
            if let Ok(b) = v.parse() {
                self.multi_tenant.enabled = b;
            }
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_LOG_LEVEL") {
            self.log.level = match v.to_lowercase().as_str() {
                "debug" => LogLevel::Debug,
                "warn" => LogLevel::Warn,
                "error" => LogLevel::Error,
                _ => LogLevel::Info,
            };
        }
        if let Ok(v) = std::env::var("DOKKU_MCP_LOG_FORMAT") {
            self.log.format = match v.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }
        self
    }

    pub fn validate(&self) -> McpResult<()> {
        if self.transport.port == 0 {
            return Err(crate::error::McpError::Configuration {
                message: "transport.port cannot be 0".to_string(),
            });
        }
        if self.dokku.port == 0 {
            return Err(crate::error::McpError::Configuration {
                message: "dokku.port must be in 1..=65535".to_string(),
            });
        }
        if self.dokku.user.is_empty() || self.dokku.user.len() > 32 {
            return Err(crate::error::McpError::Configuration {
                message: "dokku.user must be 1-32 characters".to_string(),
            });
        }
        if !self
            .dokku
            .user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
        {
            return Err(crate::error::McpError::Configuration {
                message: "dokku.user contains invalid characters".to_string(),
            });
        }
        if let Some(key_path) = &self.dokku.ssh_key_path {
            if key_path.contains("..") {
                return Err(crate::error::McpError::Configuration {
                    message: "dokku.ssh_key_path must not contain '..'".to_string(),
                });
            }
        }
        if self.dokku.timeout.is_zero() || self.dokku.timeout > Duration::from_secs(600) {
            return Err(crate::error::McpError::Configuration {
                message: "dokku.timeout must be in (0, 10 minutes]".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = DokkuMcpConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transport.port, 3000);
        assert_eq!(config.dokku.user, "dokku");
    }

    #[test]
    fn rejects_oversized_timeout() {
        let mut config = DokkuMcpConfig::default();
        config.dokku.timeout = Duration::from_secs(601);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_traversal_in_key_path() {
        let mut config = DokkuMcpConfig::default();
        config.dokku.ssh_key_path = Some("../../etc/passwd".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply_on_top_of_defaults() {
        std::env::set_var("DOKKU_MCP_DOKKU_HOST", "prod.example.com");
        std::env::set_var("DOKKU_MCP_TRANSPORT_PORT", "4100");
        let config = DokkuMcpConfig::default().with_env_overrides();
        assert_eq!(config.dokku.host, "prod.example.com");
        assert_eq!(config.transport.port, 4100);
        std::env::remove_var("DOKKU_MCP_DOKKU_HOST");
        std::env::remove_var("DOKKU_MCP_TRANSPORT_PORT");
    }

    #[test]
    fn cors_wildcard_subdomain_law() {
        let mut cors = CorsConfig::default();
        cors.allowed_origins = vec!["*.example.com".to_string()];
        assert!(cors.allows_origin("https://api.example.com"));
        assert!(!cors.allows_origin("https://example.org"));

        cors.allowed_origins = vec!["*".to_string()];
        assert!(cors.allows_origin("https://anything.test"));
    }
}
