//! # Secrets Engine Integration
//!
//! HTTP client for the HashiCorp Vault AWS secrets engine and the role
//! resolution logic built on top of it. This module is the only place in the
//! codebase that handles AWS secret material.

pub mod client;
pub mod roles;

pub use client::{CredentialLease, EngineHealth, IssuedCredentials, VaultClient};
pub use roles::RoleResolver;
