//! Purchase API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lapak_core::ValidationRules;
use lapak_db::DbConfig;
use lapak_upstream::config::DEFAULT_GATEWAY_NAME;
use lapak_upstream::UpstreamConfig;

/// Used when `INTERNAL_SECRET` is unset. Development only.
pub const DEV_INTERNAL_SECRET: &str = "backend-infra-internal-secret";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Purchase API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interface to bind
    pub server_host: String,

    /// HTTP port (default: 3004)
    pub server_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Base URL of the catalog service
    pub product_service_url: String,

    /// Base URL of the identity service
    pub user_service_url: String,

    /// Shared secret between the gateway and internal services
    #[serde(skip_serializing)]
    pub internal_secret: String,

    /// Expected `X-Auth-Gateway` value, also sent on outbound calls
    pub gateway_name: String,

    /// Lifetime of outbound propagation tokens in seconds
    pub propagation_token_ttl_secs: u64,

    /// Per-call timeout for catalog and identity requests in seconds
    pub upstream_timeout_secs: u64,

    /// Sender name length bounds
    pub sender_name_min: usize,
    pub sender_name_max: usize,

    /// Decrement catalog stock once a payment proof is attached
    pub decrement_stock_on_proof: bool,

    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of
    /// a variable if it is set.
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let config = AppConfig {
            server_host: var("SERVER_HOST", "0.0.0.0"),

            server_port: parse(&var("SERVER_PORT", "3004"), "SERVER_PORT")?,

            database_path: var("DATABASE_PATH", "purchase.db"),

            db_max_connections: parse(&var("DB_MAX_CONNECTIONS", "5"), "DB_MAX_CONNECTIONS")?,

            product_service_url: var("PRODUCT_SERVICE_URL", "http://localhost:3003"),

            user_service_url: var("USER_SERVICE_URL", "http://localhost:3002"),

            internal_secret: var("INTERNAL_SECRET", DEV_INTERNAL_SECRET),

            gateway_name: var("GATEWAY_NAME", DEFAULT_GATEWAY_NAME),

            propagation_token_ttl_secs: parse(
                &var("PROPAGATION_TOKEN_TTL_SECS", "60"),
                "PROPAGATION_TOKEN_TTL_SECS",
            )?,

            upstream_timeout_secs: parse(
                &var("UPSTREAM_TIMEOUT_SECS", "30"),
                "UPSTREAM_TIMEOUT_SECS",
            )?,

            sender_name_min: parse(&var("SENDER_NAME_MIN", "4"), "SENDER_NAME_MIN")?,

            sender_name_max: parse(&var("SENDER_NAME_MAX", "55"), "SENDER_NAME_MAX")?,

            decrement_stock_on_proof: parse_bool(
                &var("DECREMENT_STOCK_ON_PROOF", "false"),
                "DECREMENT_STOCK_ON_PROOF",
            )?,

            log_format: match var("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
            },
        };

        if config.internal_secret.is_empty() {
            return Err(ConfigError::MissingRequired("INTERNAL_SECRET".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.upstream_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("UPSTREAM_TIMEOUT_SECS".to_string()));
        }
        if config.propagation_token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue("PROPAGATION_TOKEN_TTL_SECS".to_string()));
        }

        Ok(config)
    }

    /// True when running with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.internal_secret == DEV_INTERNAL_SECRET
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    pub fn upstream_config(&self) -> Result<UpstreamConfig, ConfigError> {
        Ok(UpstreamConfig::new(
            &self.product_service_url,
            &self.user_service_url,
            self.internal_secret.clone(),
        )
        .map_err(|e| ConfigError::Upstream(e.to_string()))?
        .gateway_name(self.gateway_name.clone())
        .timeout(Duration::from_secs(self.upstream_timeout_secs))
        .token_ttl(Duration::from_secs(self.propagation_token_ttl_secs)))
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            sender_name_min: self.sender_name_min,
            sender_name_max: self.sender_name_max,
        }
    }
}

fn parse<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

fn parse_bool(raw: &str, name: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue(name.to_string())),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid upstream configuration: {0}")]
    Upstream(String),
}
