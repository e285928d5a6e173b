//! # Configuration Management
//!
//! This module provides configuration management for the cloudlink connection
//! manager. Settings are loaded from environment variables with sensible
//! defaults and validated before the service starts.

mod settings;

pub use settings::{
    AppConfig, AwsDefaults, DatabaseConfig, ObservabilityConfig, ServerConfig, VaultConfig,
};
