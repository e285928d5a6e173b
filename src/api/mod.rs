//! # REST API Components
//!
//! This module provides the REST API implementation for the connection
//! manager, including HTTP routing, request handlers, the error envelope,
//! and OpenAPI documentation.

pub mod docs;
pub mod error;
pub mod handlers;
pub mod request_id;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::{build_router, ApiState};
pub use server::start_api_server;
