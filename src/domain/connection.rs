//! Connection domain types
//!
//! This module contains pure domain entities for managed connections.
//! A connection tracks identity, the outcome of connectivity tests, and the
//! applications linked to it, without any infrastructure dependencies.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::errors::{Error, Result};

/// Provider binding of a connection record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    /// Connection without a provider binding
    None,
    /// Connection backed by an AWS secrets engine mount
    Aws,
}

impl ConnectionKind {
    /// Get the database representation of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Aws => "aws",
        }
    }
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "aws" => Ok(Self::Aws),
            _ => Err(format!("Unknown connection kind: {}", s)),
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of the most recent connectivity test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// No test has run since the connection was created or last modified
    NotTested,
    /// The most recent test failed
    Failed,
    /// The most recent test succeeded
    Succeeded,
}

impl TestStatus {
    /// Get the database representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotTested => "not_tested",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
        }
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "not_tested" => Ok(Self::NotTested),
            "failed" => Ok(Self::Failed),
            "succeeded" => Ok(Self::Succeeded),
            _ => Err(format!("Unknown test status: {}", s)),
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for TestStatus {
    fn default() -> Self {
        Self::NotTested
    }
}

/// A managed connection to an external system.
///
/// The connection carries test-state bookkeeping: every mutation of the
/// underlying target resets the status to [`TestStatus::NotTested`], and
/// credentials may only be issued once a test has succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Unique identifier (UUID)
    pub id: String,

    /// Human-readable name (unique across connections)
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Provider binding of this record
    pub kind: ConnectionKind,

    /// Outcome of the most recent connectivity test
    pub test_status: TestStatus,

    /// Failure detail of the most recent test, empty when the test passed
    pub test_error: String,

    /// When the most recent test ran (RFC 3339), empty before the first test
    pub tested_on: String,

    /// When a test last succeeded (RFC 3339), empty before the first success
    pub last_successful_test: String,

    /// Identifiers of applications linked to this connection
    pub applications: Vec<String>,

    /// Creation timestamp
    pub created_at: chrono::DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: chrono::DateTime<Utc>,
}

impl Connection {
    /// Create a new connection without a provider binding
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            kind: ConnectionKind::None,
            test_status: TestStatus::NotTested,
            test_error: String::new(),
            tested_on: String::new(),
            last_successful_test: String::new(),
            applications: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a failed connectivity test
    pub fn mark_test_failed(&mut self, reason: impl Into<String>) {
        self.test_status = TestStatus::Failed;
        self.test_error = reason.into();
        self.tested_on = Utc::now().to_rfc3339();
    }

    /// Record a successful connectivity test
    pub fn mark_test_passed(&mut self) {
        let now = Utc::now().to_rfc3339();
        self.test_status = TestStatus::Succeeded;
        self.test_error = String::new();
        self.tested_on = now.clone();
        self.last_successful_test = now;
    }

    /// Reset the test outcome after the underlying target changed.
    ///
    /// Timestamps of past tests are kept for audit purposes.
    pub fn reset_status(&mut self) {
        self.test_status = TestStatus::NotTested;
        self.test_error = String::new();
    }

    /// Link an application to this connection
    pub fn link_application(&mut self, application_id: &str) -> Result<()> {
        if self.applications.iter().any(|a| a == application_id) {
            return Err(Error::already_linked(format!(
                "Application '{}' is already linked to connection '{}'",
                application_id, self.id
            )));
        }
        self.applications.push(application_id.to_string());
        Ok(())
    }

    /// Unlink an application from this connection
    pub fn unlink_application(&mut self, application_id: &str) -> Result<()> {
        let position =
            self.applications.iter().position(|a| a == application_id).ok_or_else(|| {
                Error::link_not_found(format!(
                    "Application '{}' is not linked to connection '{}'",
                    application_id, self.id
                ))
            })?;
        self.applications.remove(position);
        Ok(())
    }
}
