//! # Error Handling
//!
//! This module provides error handling for the cloudlink connection manager.
//! It defines custom error types using `thiserror` for the datastore, the
//! secrets engine client, and the provisioning workflows built on top of them.

/// Custom result type for cloudlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the cloudlink connection manager
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request or payload validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Policy ARN constraint violations for the requested credential type
    #[error("Invalid policy ARNs: {0}")]
    InvalidPolicyArns(String),

    /// Lease TTL constraint violations for the requested credential type
    #[error("Invalid lease TTL: {0}")]
    InvalidLeaseTtl(String),

    /// Resource not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// An application link that was expected to exist is absent
    #[error("Link not found: {0}")]
    LinkNotFound(String),

    /// An application link that must not exist is already present
    #[error("Application already linked: {0}")]
    AlreadyLinked(String),

    /// Credential issuance requested before a successful connectivity test
    #[error("Connection not tested successfully: {0}")]
    NotTestedSuccessfully(String),

    /// Database and storage errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// A write touched a different number of rows than expected
    #[error("Unexpected row count: {0}")]
    UnexpectedRowCount(String),

    /// Network transport errors (HTTP server)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The secrets engine could not be reached at all
    #[error("Secrets engine unreachable: {context}")]
    EngineTransport {
        #[source]
        source: reqwest::Error,
        context: String,
    },

    /// The secrets engine rejected our service credentials
    #[error("Secrets engine authentication failed: {0}")]
    EngineAuth(String),

    /// The secrets engine is sealed, uninitialized, or otherwise not serving
    #[error("Secrets engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Mounting an engine instance failed
    #[error("Failed to enable secrets engine: {0}")]
    EngineEnable(String),

    /// Unmounting an engine instance failed
    #[error("Failed to disable secrets engine: {0}")]
    EngineDisable(String),

    /// Writing engine configuration (tune, root credentials, role) failed
    #[error("Failed to configure secrets engine: {0}")]
    EngineConfigure(String),

    /// The engine mount did not hold exactly one credential role
    #[error("Role resolution failed: {0}")]
    RoleResolution(String),

    /// The engine refused or failed to issue ephemeral credentials
    #[error("Credential issuance failed: {0}")]
    CredentialIssuance(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a policy ARN constraint error
    pub fn invalid_policy_arns<S: Into<String>>(message: S) -> Self {
        Self::InvalidPolicyArns(message.into())
    }

    /// Create a lease TTL constraint error
    pub fn invalid_lease_ttl<S: Into<String>>(message: S) -> Self {
        Self::InvalidLeaseTtl(message.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a link not found error
    pub fn link_not_found<S: Into<String>>(message: S) -> Self {
        Self::LinkNotFound(message.into())
    }

    /// Create an already linked error
    pub fn already_linked<S: Into<String>>(message: S) -> Self {
        Self::AlreadyLinked(message.into())
    }

    /// Create a not-tested-successfully error
    pub fn not_tested<S: Into<String>>(message: S) -> Self {
        Self::NotTestedSuccessfully(message.into())
    }

    /// Create a database error with context
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Create an unexpected row count error
    pub fn unexpected_row_count<S: Into<String>>(message: S) -> Self {
        Self::UnexpectedRowCount(message.into())
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create an engine transport error with context
    pub fn engine_transport<S: Into<String>>(source: reqwest::Error, context: S) -> Self {
        Self::EngineTransport { source, context: context.into() }
    }

    /// Create an engine authentication error
    pub fn engine_auth<S: Into<String>>(message: S) -> Self {
        Self::EngineAuth(message.into())
    }

    /// Create an engine unavailable error
    pub fn engine_unavailable<S: Into<String>>(message: S) -> Self {
        Self::EngineUnavailable(message.into())
    }

    /// Create an engine enable error
    pub fn engine_enable<S: Into<String>>(message: S) -> Self {
        Self::EngineEnable(message.into())
    }

    /// Create an engine disable error
    pub fn engine_disable<S: Into<String>>(message: S) -> Self {
        Self::EngineDisable(message.into())
    }

    /// Create an engine configuration error
    pub fn engine_configure<S: Into<String>>(message: S) -> Self {
        Self::EngineConfigure(message.into())
    }

    /// Create a role resolution error
    pub fn role_resolution<S: Into<String>>(message: S) -> Self {
        Self::RoleResolution(message.into())
    }

    /// Create a credential issuance error
    pub fn credential_issuance<S: Into<String>>(message: S) -> Self {
        Self::CredentialIssuance(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::InvalidPolicyArns(_) | Error::InvalidLeaseTtl(_) => 400,
            Error::AlreadyLinked(_) => 400,
            Error::NotFound(_) | Error::LinkNotFound(_) => 404,
            Error::NotTestedSuccessfully(_) => 412,
            Error::EngineTransport { .. } | Error::EngineAuth(_) | Error::EngineUnavailable(_) => {
                502
            }
            Error::Config(_)
            | Error::Database { .. }
            | Error::UnexpectedRowCount(_)
            | Error::Transport(_)
            | Error::EngineEnable(_)
            | Error::EngineDisable(_)
            | Error::EngineConfigure(_)
            | Error::RoleResolution(_)
            | Error::CredentialIssuance(_)
            | Error::Io(_)
            | Error::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code for the error envelope and logs
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration_error",
            Error::Validation(_) => "validation_error",
            Error::InvalidPolicyArns(_) => "invalid_policy_arns",
            Error::InvalidLeaseTtl(_) => "invalid_lease_ttl",
            Error::NotFound(_) => "not_found",
            Error::LinkNotFound(_) => "link_not_found",
            Error::AlreadyLinked(_) => "application_already_linked",
            Error::NotTestedSuccessfully(_) => "not_tested_successfully",
            Error::Database { .. } => "datastore_error",
            Error::UnexpectedRowCount(_) => "unexpected_row_count",
            Error::Transport(_) => "transport_error",
            Error::EngineTransport { .. } => "engine_unreachable",
            Error::EngineAuth(_) => "engine_authentication_failed",
            Error::EngineUnavailable(_) => "engine_unavailable",
            Error::EngineEnable(_) => "engine_enable_failed",
            Error::EngineDisable(_) => "engine_disable_failed",
            Error::EngineConfigure(_) => "engine_configure_failed",
            Error::RoleResolution(_) => "role_resolution_failed",
            Error::CredentialIssuance(_) => "credential_issuance_failed",
            Error::Io(_) => "io_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Database { .. } | Error::Io(_) | Error::EngineTransport { .. }
        )
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::validation(format!("Validation failed: {}", message))
    }
}
