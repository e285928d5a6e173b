//! Common test utilities for all integration tests.
//!
//! Provides shared test database setup, a stubbed secrets engine, and
//! service/router builders wired to both.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

pub mod engine_stub;
pub mod fixtures;
pub mod test_db;
