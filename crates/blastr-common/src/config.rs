//! Configuration for Blastr

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Messaging gateway configuration
    pub gateway: GatewayConfig,

    /// Dispatch policy configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            bind_address: default_bind_address(),
        }
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API port
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Messaging gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API
    pub base_url: String,

    /// API key sent on every gateway request
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
}

fn default_gateway_timeout() -> u64 {
    30
}

/// Dispatch policy configuration.
///
/// Every pacing and gating constant lives here and is passed into the
/// campaign service and scheduler at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Contacts per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay between consecutive sends within a batch (milliseconds)
    #[serde(default = "default_inter_message_delay_ms")]
    pub inter_message_delay_ms: u64,

    /// Delay between consecutive batches of a campaign (seconds)
    #[serde(default = "default_inter_batch_interval_secs")]
    pub inter_batch_interval_secs: u64,

    /// Credits debited per successful send
    #[serde(default = "default_per_message_cost")]
    pub per_message_cost: Decimal,

    /// Maximum successful sends per tenant per UTC day
    #[serde(default = "default_daily_limit_max")]
    pub daily_limit_max: i64,

    /// Maximum media source size in bytes
    #[serde(default = "default_media_max_bytes")]
    pub media_max_bytes: u64,

    /// Scheduler poll cadence (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Delay before batch 1 runs after a campaign restart (seconds)
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,

    /// Maximum batches processed concurrently (distinct campaigns)
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            inter_message_delay_ms: default_inter_message_delay_ms(),
            inter_batch_interval_secs: default_inter_batch_interval_secs(),
            per_message_cost: default_per_message_cost(),
            daily_limit_max: default_daily_limit_max(),
            media_max_bytes: default_media_max_bytes(),
            poll_interval_secs: default_poll_interval_secs(),
            restart_delay_secs: default_restart_delay_secs(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

fn default_batch_size() -> usize {
    20
}

fn default_inter_message_delay_ms() -> u64 {
    2000
}

fn default_inter_batch_interval_secs() -> u64 {
    1800
}

fn default_per_message_cost() -> Decimal {
    // 0.09 currency units
    Decimal::new(9, 2)
}

fn default_daily_limit_max() -> i64 {
    500
}

fn default_media_max_bytes() -> u64 {
    200 * 1024 * 1024
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_restart_delay_secs() -> u64 {
    5
}

fn default_concurrency_limit() -> usize {
    4
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> crate::Result<Self> {
        let paths = [
            std::path::PathBuf::from("./config.toml"),
            std::path::PathBuf::from("/etc/blastr/config.toml"),
        ];

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(crate::Error::Config(
            "No configuration file found".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_dispatch_config() {
        let dispatch = DispatchConfig::default();
        assert_eq!(dispatch.batch_size, 20);
        assert_eq!(dispatch.inter_message_delay_ms, 2000);
        assert_eq!(dispatch.inter_batch_interval_secs, 1800);
        assert_eq!(dispatch.per_message_cost, Decimal::new(9, 2));
        assert_eq!(dispatch.daily_limit_max, 500);
        assert_eq!(dispatch.media_max_bytes, 200 * 1024 * 1024);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
hostname = "dispatch.example.com"

[database]
url = "postgres://localhost/blastr"

[gateway]
base_url = "http://localhost:8085"
api_key = "secret"

[dispatch]
batch_size = 50
inter_batch_interval_secs = 3600
per_message_cost = "0.09"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.hostname, "dispatch.example.com");
        assert_eq!(config.database.url, "postgres://localhost/blastr");
        assert_eq!(config.gateway.base_url, "http://localhost:8085");
        assert_eq!(config.dispatch.batch_size, 50);
        assert_eq!(config.dispatch.per_message_cost, Decimal::new(9, 2));
        // Unset keys fall back to defaults
        assert_eq!(config.dispatch.inter_message_delay_ms, 2000);
    }
}
