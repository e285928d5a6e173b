//! # Cloudlink
//!
//! Cloudlink is a connection manager for cloud provider accounts. It keeps
//! the relational bookkeeping for each connection while delegating every
//! piece of secret material to a HashiCorp Vault AWS secrets engine: root
//! credentials are written to a per-connection mount and never read back,
//! and callers obtain short-lived credentials as engine-issued leases.
//!
//! ## Architecture
//!
//! The system follows a layered architecture pattern:
//!
//! ```text
//! REST API Layer → Provisioning Service → Secrets Engine (Vault)
//!      ↓                    ↓
//! OpenAPI Docs       Persistence Layer (SQLite)
//! ```
//!
//! ## Core Components
//!
//! - **REST API**: Axum-based HTTP server for connection management
//! - **Provisioning Service**: Sequences store and engine operations with
//!   compensation on partial failure
//! - **Secrets Engine Client**: AppRole-authenticated Vault AWS engine client
//! - **Persistence Layer**: SQLx with SQLite for connection records

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod services;
pub mod storage;
pub mod vault;

// Re-export commonly used types and traits
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "cloudlink");
    }
}
