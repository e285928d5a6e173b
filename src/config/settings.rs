//! # Configuration Settings
//!
//! Defines the configuration structure for the cloudlink connection manager.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Database configuration
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Secrets engine configuration
    #[validate(nested)]
    pub vault: VaultConfig,

    /// Defaults applied to AWS engine mounts
    #[validate(nested)]
    pub aws: AwsDefaults,
}

impl AppConfig {
    /// Create the full configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            vault: VaultConfig::from_env()?,
            aws: AwsDefaults::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        // Use validator crate for basic validation
        Validate::validate(self).map_err(Error::from)?;

        // Custom validation logic
        self.validate_custom()?;

        Ok(())
    }

    /// Custom validation logic that goes beyond what the validator crate can do
    fn validate_custom(&self) -> Result<()> {
        // Validate database URL format
        if !self.database.url.starts_with("sqlite://") {
            return Err(Error::validation("Database URL must start with 'sqlite://'"));
        }

        if self.aws.default_lease_ttl_seconds > self.aws.max_lease_ttl_seconds {
            return Err(Error::validation(
                "Default lease TTL cannot exceed the maximum lease TTL",
            ));
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Default page size for list endpoints when the caller supplies none
    #[validate(range(min = 1, message = "Default list limit must be at least 1"))]
    pub default_list_limit: i64,

    /// Hard cap on page size for list endpoints
    #[validate(range(min = 1, message = "Max list results must be at least 1"))]
    pub max_list_results: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_list_limit: 50,
            max_list_results: 500,
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Create ServerConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("CLOUDLINK_API_HOST").unwrap_or(defaults.host);

        let port = match std::env::var("CLOUDLINK_API_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .map_err(|e| Error::config(format!("Invalid CLOUDLINK_API_PORT: {}", e)))?,
            Err(_) => defaults.port,
        };

        let default_list_limit = std::env::var("CLOUDLINK_LIST_LIMIT")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.default_list_limit);

        let max_list_results = std::env::var("CLOUDLINK_MAX_RESULTS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.max_list_results);

        Ok(Self { host, port, default_list_limit, max_list_results })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[validate(range(min = 0, max = 50, message = "Min connections must be between 0 and 50"))]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[validate(range(
        min = 1,
        max = 60,
        message = "Connect timeout must be between 1 and 60 seconds"
    ))]
    pub connect_timeout_seconds: u64,

    /// Idle timeout in seconds (0 = no timeout)
    pub idle_timeout_seconds: u64,

    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/cloudlink.db".to_string(),
            max_connections: 10,
            min_connections: 0,
            connect_timeout_seconds: 10,
            idle_timeout_seconds: 600, // 10 minutes
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    /// Get connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get idle timeout as Duration (None if 0)
    pub fn idle_timeout(&self) -> Option<Duration> {
        if self.idle_timeout_seconds == 0 {
            None
        } else {
            Some(Duration::from_secs(self.idle_timeout_seconds))
        }
    }

    /// Check if this is a SQLite configuration
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite://")
    }

    /// Create DatabaseConfig from environment variables
    pub fn from_env() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/cloudlink.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DATABASE_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);

        let connect_timeout_seconds = std::env::var("DATABASE_CONNECT_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        let idle_timeout_seconds = std::env::var("DATABASE_IDLE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(600);

        let auto_migrate = std::env::var("DATABASE_AUTO_MIGRATE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(true);

        Self {
            url,
            max_connections,
            min_connections,
            connect_timeout_seconds,
            idle_timeout_seconds,
            auto_migrate,
        }
    }
}

/// Secrets engine (Vault) connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VaultConfig {
    /// Engine host
    #[validate(length(min = 1, message = "Vault host cannot be empty"))]
    pub host: String,

    /// Engine port (None = default port of the scheme)
    pub port: Option<u16>,

    /// Use HTTPS when talking to the engine
    pub https: bool,

    /// Skip TLS certificate verification (self-signed dev deployments)
    pub tls_skip_verify: bool,

    /// AppRole role id used to authenticate this service
    pub role_id: String,

    /// AppRole secret id used to authenticate this service
    pub secret_id: String,

    /// Prefix under which AWS engine instances are mounted
    #[validate(length(min = 1, message = "Vault path prefix cannot be empty"))]
    pub path_prefix: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: Some(8200),
            https: false,
            tls_skip_verify: false,
            role_id: String::new(),
            secret_id: String::new(),
            path_prefix: "cloudlink".to_string(),
        }
    }
}

impl VaultConfig {
    /// Base URL of the engine API, without a trailing slash
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{}://{}:{}", scheme, self.host, port),
            None => format!("{}://{}", scheme, self.host),
        }
    }

    /// Create VaultConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = std::env::var("VAULT_HOST").unwrap_or(defaults.host);

        let port = match std::env::var("VAULT_PORT") {
            Ok(value) => Some(
                value
                    .parse::<u16>()
                    .map_err(|e| Error::config(format!("Invalid VAULT_PORT: {}", e)))?,
            ),
            Err(_) => defaults.port,
        };

        let https = std::env::var("VAULT_HTTPS")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.https);

        let tls_skip_verify = std::env::var("VAULT_TLS_SKIP_VERIFY")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.tls_skip_verify);

        let role_id = std::env::var("VAULT_ROLE_ID").unwrap_or_default();
        let secret_id = std::env::var("VAULT_SECRET_ID").unwrap_or_default();

        let path_prefix = std::env::var("VAULT_PATH_PREFIX").unwrap_or(defaults.path_prefix);

        Ok(Self { host, port, https, tls_skip_verify, role_id, secret_id, path_prefix })
    }
}

/// Defaults applied to AWS engine mounts when a request leaves TTLs unset
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AwsDefaults {
    /// Default lease TTL applied to issued credentials, in seconds
    #[validate(range(min = 1, message = "Default lease TTL must be at least 1 second"))]
    pub default_lease_ttl_seconds: u64,

    /// Maximum lease TTL allowed for issued credentials, in seconds
    #[validate(range(min = 1, message = "Max lease TTL must be at least 1 second"))]
    pub max_lease_ttl_seconds: u64,
}

impl Default for AwsDefaults {
    fn default() -> Self {
        Self {
            default_lease_ttl_seconds: 3600,  // 1 hour
            max_lease_ttl_seconds: 14400,     // 4 hours
        }
    }
}

impl AwsDefaults {
    /// Default lease TTL in the engine's duration string form
    pub fn default_lease_ttl(&self) -> String {
        format!("{}s", self.default_lease_ttl_seconds)
    }

    /// Maximum lease TTL in the engine's duration string form
    pub fn max_lease_ttl(&self) -> String {
        format!("{}s", self.max_lease_ttl_seconds)
    }

    /// Create AwsDefaults from environment variables
    pub fn from_env() -> Self {
        let default_lease_ttl_seconds = std::env::var("CLOUDLINK_DEFAULT_LEASE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(3600);

        let max_lease_ttl_seconds = std::env::var("CLOUDLINK_MAX_LEASE_TTL_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(14400);

        Self { default_lease_ttl_seconds, max_lease_ttl_seconds }
    }
}

/// Observability configuration for logging and tracing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Tracing service name
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "cloudlink".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Create ObservabilityConfig from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let service_name =
            std::env::var("CLOUDLINK_SERVICE_NAME").unwrap_or(defaults.service_name);

        let log_level = std::env::var("CLOUDLINK_LOG_LEVEL").unwrap_or(defaults.log_level);

        let json_logging = std::env::var("CLOUDLINK_JSON_LOGGING")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(defaults.json_logging);

        Self { service_name, log_level, json_logging }
    }
}
