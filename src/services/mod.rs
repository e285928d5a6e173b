//! Business logic services
//!
//! This module contains service layer components that encapsulate
//! business logic, separated from HTTP concerns.

pub mod compensation;
pub mod connection_service;

pub use compensation::{CompensationStack, CompensationStep};
pub use connection_service::{
    AwsConnectionPage, ConnectionPage, ConnectionService, CreateAwsConnectionInput,
    ServiceSettings, UpdateAwsConnectionInput,
};
