//! AWS connection domain types
//!
//! An AWS connection pairs a base [`Connection`](super::Connection) record
//! with a dedicated AWS secrets engine mount. The relational side stores only
//! the mount path; root credentials, roles, and lease settings live in the
//! engine and are read back from it when a connection is hydrated.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::domain::connection::{Connection, ConnectionKind};
use crate::errors::{Error, Result};

/// Kind of credentials an engine role issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    /// Long-lived IAM user credentials scoped by managed policy ARNs
    IamUser,
    /// Short-lived session tokens with engine-managed lease TTLs
    SessionToken,
}

impl CredentialType {
    /// Get the engine representation of this credential type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IamUser => "iam_user",
            Self::SessionToken => "session_token",
        }
    }

    /// Validate the lease TTLs a caller supplied for this credential type.
    ///
    /// Session-token roles derive their lease windows from the engine mount,
    /// so a request for that type must leave both TTL fields empty. The check
    /// applies to the raw request fields, not to hydrated engine state: a
    /// mounted engine always reports tuned, non-empty TTLs.
    pub fn validate_requested_ttls(&self, default_lease_ttl: &str, max_lease_ttl: &str) -> Result<()> {
        if *self == Self::SessionToken && (!default_lease_ttl.is_empty() || !max_lease_ttl.is_empty())
        {
            return Err(Error::invalid_lease_ttl(
                "Lease TTLs cannot be set for session_token credentials",
            ));
        }
        Ok(())
    }
}

impl FromStr for CredentialType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "iam_user" => Ok(Self::IamUser),
            "session_token" => Ok(Self::SessionToken),
            _ => Err(format!("Unknown credential type: {}", s)),
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Engine-held settings of an AWS connection.
///
/// The secret access key is deliberately absent: it is written to the engine
/// at provisioning time and never read back.
#[derive(Debug, Clone, PartialEq)]
pub struct AwsEngineSettings {
    /// AWS access key id of the root credentials
    pub access_key: String,

    /// Region used for IAM and STS calls
    pub default_region: String,

    /// Default lease TTL in duration string form, e.g. "3600s"
    pub default_lease_ttl: String,

    /// Maximum lease TTL in duration string form, e.g. "14400s"
    pub max_lease_ttl: String,

    /// Name of the single credential role on the mount
    pub role_name: String,

    /// Kind of credentials the role issues
    pub credential_type: CredentialType,

    /// Managed policy ARNs attached to issued credentials
    pub policy_arns: Vec<String>,
}

impl AwsEngineSettings {
    /// Validate constraints that depend on the credential type.
    ///
    /// Applies to the fully merged settings, after request fields and any
    /// existing engine state have been combined.
    pub fn validate(&self) -> Result<()> {
        if self.credential_type == CredentialType::IamUser {
            if self.policy_arns.is_empty() || self.policy_arns.iter().any(|arn| arn.is_empty()) {
                return Err(Error::invalid_policy_arns(
                    "At least one non-empty policy ARN is required for iam_user credentials",
                ));
            }
        }
        Ok(())
    }
}

/// Derive the engine mount path for an AWS connection
pub fn derive_vault_path(prefix: &str, aws_connection_id: &str) -> String {
    format!("{}/aws_{}", prefix, aws_connection_id)
}

/// Relational record of an AWS connection, paired with its base connection
#[derive(Debug, Clone, PartialEq)]
pub struct AwsConnection {
    /// Unique identifier (UUID)
    pub id: String,

    /// Identifier of the base connection record
    pub connection_id: String,

    /// Engine mount path backing this connection
    pub vault_path: String,

    /// Creation timestamp
    pub created_at: chrono::DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: chrono::DateTime<Utc>,

    /// The base connection record
    pub connection: Connection,
}

impl AwsConnection {
    /// Create a new AWS connection with a freshly derived mount path
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        vault_path_prefix: &str,
    ) -> Self {
        let mut connection = Connection::new(name, description);
        connection.kind = ConnectionKind::Aws;

        let id = uuid::Uuid::new_v4().to_string();
        let vault_path = derive_vault_path(vault_path_prefix, &id);
        let now = Utc::now();

        Self {
            id,
            connection_id: connection.id.clone(),
            vault_path,
            created_at: now,
            updated_at: now,
            connection,
        }
    }
}

/// A fully hydrated AWS connection: the relational record plus the
/// engine-held settings read back from its mount
#[derive(Debug, Clone)]
pub struct AwsConnectionDetails {
    /// The relational record
    pub record: AwsConnection,

    /// Settings read from the engine mount
    pub settings: AwsEngineSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(credential_type: CredentialType, policy_arns: Vec<&str>) -> AwsEngineSettings {
        AwsEngineSettings {
            access_key: "AKIAEXAMPLE".to_string(),
            default_region: "eu-west-1".to_string(),
            default_lease_ttl: "3600s".to_string(),
            max_lease_ttl: "14400s".to_string(),
            role_name: "deploy".to_string(),
            credential_type,
            policy_arns: policy_arns.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_new_aws_connection_derives_mount_path() {
        let aws = AwsConnection::new("prod-account", "production", "cloudlink");
        assert_eq!(aws.vault_path, format!("cloudlink/aws_{}", aws.id));
        assert_eq!(aws.connection.kind, ConnectionKind::Aws);
        assert_eq!(aws.connection_id, aws.connection.id);
        assert_ne!(aws.id, aws.connection.id);
    }

    #[test]
    fn test_vault_path_uses_aws_connection_id() {
        assert_eq!(derive_vault_path("cloudlink", "abc-123"), "cloudlink/aws_abc-123");
    }

    #[test]
    fn test_iam_user_requires_policy_arns() {
        let valid = settings(
            CredentialType::IamUser,
            vec!["arn:aws:iam::aws:policy/ReadOnlyAccess"],
        );
        assert!(valid.validate().is_ok());

        let missing = settings(CredentialType::IamUser, vec![]);
        assert!(matches!(missing.validate().unwrap_err(), Error::InvalidPolicyArns(_)));

        let blank = settings(CredentialType::IamUser, vec![""]);
        assert!(matches!(blank.validate().unwrap_err(), Error::InvalidPolicyArns(_)));
    }

    #[test]
    fn test_session_token_allows_empty_policy_arns() {
        let valid = settings(CredentialType::SessionToken, vec![]);
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_session_token_rejects_requested_ttls() {
        let err = CredentialType::SessionToken.validate_requested_ttls("3600s", "").unwrap_err();
        assert!(matches!(err, Error::InvalidLeaseTtl(_)));

        let err = CredentialType::SessionToken.validate_requested_ttls("", "7200s").unwrap_err();
        assert!(matches!(err, Error::InvalidLeaseTtl(_)));

        assert!(CredentialType::SessionToken.validate_requested_ttls("", "").is_ok());
        assert!(CredentialType::IamUser.validate_requested_ttls("3600s", "14400s").is_ok());
    }

    #[test]
    fn test_credential_type_round_trip() {
        assert_eq!(CredentialType::IamUser.as_str(), "iam_user");
        assert_eq!("session_token".parse::<CredentialType>().unwrap(), CredentialType::SessionToken);
        assert!("federation_token".parse::<CredentialType>().is_err());

        let json = serde_json::to_string(&CredentialType::IamUser).unwrap();
        assert_eq!(json, "\"iam_user\"");
    }
}
