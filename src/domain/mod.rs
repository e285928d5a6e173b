//! Domain layer
//!
//! This module contains pure domain entities and business logic with zero
//! infrastructure dependencies. Domain types represent the core concepts of
//! the connection manager: connections, their AWS bindings, and the
//! test-state rules governing credential issuance.
//!
//! ## Module Organization
//!
//! - `connection`: Base connection entity, kinds, and test-status tracking
//! - `aws`: AWS connection entity, engine settings, and credential types

pub mod aws;
pub mod connection;

// Re-export main types from each module
pub use aws::{
    derive_vault_path, AwsConnection, AwsConnectionDetails, AwsEngineSettings, CredentialType,
};
pub use connection::{Connection, ConnectionKind, TestStatus};
