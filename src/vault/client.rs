//! HashiCorp Vault AWS secrets engine client.
//!
//! This client speaks the Vault HTTP API directly. Each connection gets its
//! own AWS secrets engine mount, and all secret material (root credentials,
//! issued keys) lives exclusively inside Vault. The relational store only
//! ever sees the mount path.
//!
//! # Authentication
//!
//! Every operation authenticates with a fresh AppRole login. Tokens are
//! request-scoped and never cached, so a revoked AppRole takes effect on the
//! next call rather than at some token expiry horizon.
//!
//! # Security
//!
//! - AppRole secret IDs and Vault tokens are never logged
//! - Secret access keys pass through to Vault and are never echoed back
//! - TLS verification can only be disabled via explicit configuration

use serde::Deserialize;

use crate::config::VaultConfig;
use crate::domain::CredentialType;
use crate::errors::{Error, Result};

/// Health of the secrets engine process itself.
///
/// Standby instances still answer requests in an HA deployment, so both
/// variants count as reachable. Sealed or uninitialized instances surface as
/// errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineHealth {
    /// Unsealed and serving requests
    Active,
    /// Unsealed but deferring to the active node
    Standby,
}

/// Lease handed out when credentials are issued from a mount.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialLease {
    pub lease_id: String,
    pub lease_duration: u64,
    pub renewable: bool,
    pub data: IssuedCredentials,
}

/// Ephemeral AWS credentials inside a lease.
///
/// These only ever travel from Vault to the caller. They are never persisted
/// and never logged.
#[derive(Clone, Deserialize)]
pub struct IssuedCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub security_token: Option<String>,
}

impl std::fmt::Debug for IssuedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("security_token", &self.security_token.as_deref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: LoginAuth,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct TuneResponse {
    data: TuneData,
}

#[derive(Deserialize)]
struct TuneData {
    default_lease_ttl: u64,
    max_lease_ttl: u64,
}

#[derive(Deserialize)]
struct RootConfigResponse {
    data: RootConfigData,
}

#[derive(Deserialize)]
struct RootConfigData {
    access_key: String,
    region: String,
}

#[derive(Deserialize)]
struct RoleListResponse {
    data: RoleListData,
}

#[derive(Deserialize)]
struct RoleListData {
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct RoleResponse {
    data: RoleData,
}

#[derive(Deserialize)]
struct RoleData {
    credential_type: String,
    #[serde(default)]
    policy_arns: Vec<String>,
}

/// Client for the Vault AWS secrets engine.
#[derive(Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base_url: String,
    role_id: String,
    secret_id: String,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("base_url", &self.base_url)
            .field("role_id", &self.role_id)
            .field("secret_id", &"[REDACTED]")
            .finish()
    }
}

impl VaultClient {
    /// Create a new client from Vault configuration.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.tls_skip_verify)
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url(),
            role_id: config.role_id.clone(),
            secret_id: config.secret_id.clone(),
        })
    }

    /// Perform an AppRole login and return the client token.
    async fn token(&self) -> Result<String> {
        let url = format!("{}/v1/auth/approle/login", self.base_url);
        let payload = serde_json::json!({
            "role_id": self.role_id,
            "secret_id": self.secret_id,
        });

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "AppRole login request failed"))?;

        if !response.status().is_success() {
            return Err(Error::engine_auth(format!(
                "AppRole login rejected with status {}",
                response.status()
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| Error::engine_transport(e, "AppRole login response was unreadable"))?;

        Ok(login.auth.client_token)
    }

    /// Check the health of the Vault instance.
    ///
    /// The health endpoint reports state through status codes rather than the
    /// body, and it does not require authentication.
    pub async fn health(&self) -> Result<EngineHealth> {
        let url = format!("{}/v1/sys/health", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Health check request failed"))?;

        match response.status().as_u16() {
            200 => Ok(EngineHealth::Active),
            429 => Ok(EngineHealth::Standby),
            500 => Err(Error::engine_unavailable("Secrets engine is sealed or in an error state")),
            501 => Err(Error::engine_unavailable("Secrets engine is not initialized")),
            status => Err(Error::engine_unavailable(format!(
                "Secrets engine health check returned unexpected status {}",
                status
            ))),
        }
    }

    /// Mount an AWS secrets engine at the given path.
    pub async fn enable_engine(&self, mount_path: &str) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/v1/sys/mounts/{}", self.base_url, mount_path);
        let payload = serde_json::json!({ "type": "aws" });

        let response = self
            .http
            .post(&url)
            .header("X-Vault-Token", token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Engine mount request failed"))?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine_enable(format!(
                "Mounting '{}' returned status {}: {}",
                mount_path, status, body
            )));
        }

        tracing::debug!(mount_path = %mount_path, "Mounted AWS secrets engine");
        Ok(())
    }

    /// Unmount the AWS secrets engine at the given path.
    ///
    /// Unmounting revokes every outstanding lease on the mount and destroys
    /// the stored root credentials.
    pub async fn disable_engine(&self, mount_path: &str) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/v1/sys/mounts/{}", self.base_url, mount_path);

        let response = self
            .http
            .delete(&url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Engine unmount request failed"))?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine_disable(format!(
                "Unmounting '{}' returned status {}: {}",
                mount_path, status, body
            )));
        }

        tracing::debug!(mount_path = %mount_path, "Unmounted AWS secrets engine");
        Ok(())
    }

    /// Tune the lease TTLs on a mount. TTLs are duration strings like "3600s".
    pub async fn tune_lease_ttls(
        &self,
        mount_path: &str,
        default_lease_ttl: &str,
        max_lease_ttl: &str,
    ) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/v1/sys/mounts/{}/tune", self.base_url, mount_path);
        let payload = serde_json::json!({
            "default_lease_ttl": default_lease_ttl,
            "max_lease_ttl": max_lease_ttl,
        });

        let response = self
            .http
            .post(&url)
            .header("X-Vault-Token", token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Lease tune request failed"))?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine_configure(format!(
                "Tuning lease TTLs on '{}' returned status {}: {}",
                mount_path, status, body
            )));
        }

        Ok(())
    }

    /// Read the lease TTLs tuned on a mount, as duration strings.
    ///
    /// Vault reports tuned TTLs in integer seconds even when they were
    /// written as duration strings, so the values are normalized back to the
    /// "{n}s" form used everywhere else.
    pub async fn read_lease_ttls(&self, mount_path: &str) -> Result<(String, String)> {
        let token = self.token().await?;
        let url = format!("{}/v1/sys/mounts/{}/tune", self.base_url, mount_path);

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Lease tune read request failed"))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine_configure(format!(
                "Reading lease TTLs on '{}' returned status {}: {}",
                mount_path, status, body
            )));
        }

        let tune: TuneResponse = response
            .json()
            .await
            .map_err(|e| Error::engine_transport(e, "Lease tune response was unreadable"))?;

        Ok((
            format!("{}s", tune.data.default_lease_ttl),
            format!("{}s", tune.data.max_lease_ttl),
        ))
    }

    /// Store AWS root credentials on a mount.
    ///
    /// The secret key crosses this boundary exactly once and cannot be read
    /// back. `read_root_config` only ever returns the access key and region.
    pub async fn write_root_credentials(
        &self,
        mount_path: &str,
        access_key: &str,
        secret_key: &str,
        region: &str,
    ) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/v1/{}/config/root", self.base_url, mount_path);
        let payload = serde_json::json!({
            "access_key": access_key,
            "secret_key": secret_key,
            "region": region,
        });

        let response = self
            .http
            .post(&url)
            .header("X-Vault-Token", token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Root credential write request failed"))?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status();
            return Err(Error::engine_configure(format!(
                "Writing root credentials on '{}' returned status {}",
                mount_path, status
            )));
        }

        Ok(())
    }

    /// Read the non-secret parts of a mount's root configuration.
    pub async fn read_root_config(&self, mount_path: &str) -> Result<(String, String)> {
        let token = self.token().await?;
        let url = format!("{}/v1/{}/config/root", self.base_url, mount_path);

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Root config read request failed"))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            return Err(Error::engine_configure(format!(
                "Reading root config on '{}' returned status {}",
                mount_path, status
            )));
        }

        let config: RootConfigResponse = response
            .json()
            .await
            .map_err(|e| Error::engine_transport(e, "Root config response was unreadable"))?;

        Ok((config.data.access_key, config.data.region))
    }

    /// Write a credential role on a mount.
    pub async fn write_role(
        &self,
        mount_path: &str,
        role_name: &str,
        credential_type: CredentialType,
        policy_arns: &[String],
    ) -> Result<()> {
        let token = self.token().await?;
        let url = format!("{}/v1/{}/roles/{}", self.base_url, mount_path, role_name);
        let payload = serde_json::json!({
            "policy_arns": policy_arns,
            "credential_type": credential_type.as_str(),
        });

        let response = self
            .http
            .post(&url)
            .header("X-Vault-Token", token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Role write request failed"))?;

        if response.status() != reqwest::StatusCode::NO_CONTENT {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::engine_configure(format!(
                "Writing role '{}' on '{}' returned status {}: {}",
                role_name, mount_path, status, body
            )));
        }

        Ok(())
    }

    /// List the credential roles defined on a mount.
    ///
    /// Vault answers LIST with 404 when no roles exist, which is reported
    /// here as an empty list rather than an error.
    pub async fn list_roles(&self, mount_path: &str) -> Result<Vec<String>> {
        let token = self.token().await?;
        let url = format!("{}/v1/{}/roles", self.base_url, mount_path);
        let method = reqwest::Method::from_bytes(b"LIST")
            .map_err(|e| Error::internal(format!("Failed to build LIST method: {}", e)))?;

        let response = self
            .http
            .request(method, &url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Role list request failed"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            return Err(Error::engine_configure(format!(
                "Listing roles on '{}' returned status {}",
                mount_path, status
            )));
        }

        let roles: RoleListResponse = response
            .json()
            .await
            .map_err(|e| Error::engine_transport(e, "Role list response was unreadable"))?;

        Ok(roles.data.keys)
    }

    /// Read a credential role's type and policy ARNs.
    pub async fn read_role(
        &self,
        mount_path: &str,
        role_name: &str,
    ) -> Result<(CredentialType, Vec<String>)> {
        let token = self.token().await?;
        let url = format!("{}/v1/{}/roles/{}", self.base_url, mount_path, role_name);

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Role read request failed"))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            return Err(Error::engine_configure(format!(
                "Reading role '{}' on '{}' returned status {}",
                role_name, mount_path, status
            )));
        }

        let role: RoleResponse = response
            .json()
            .await
            .map_err(|e| Error::engine_transport(e, "Role response was unreadable"))?;

        let credential_type = role
            .data
            .credential_type
            .parse()
            .map_err(|e: String| Error::engine_configure(format!("Role '{}': {}", role_name, e)))?;

        Ok((credential_type, role.data.policy_arns))
    }

    /// Issue ephemeral credentials against a role.
    pub async fn issue_credentials(
        &self,
        mount_path: &str,
        role_name: &str,
    ) -> Result<CredentialLease> {
        let token = self.token().await?;
        let url = format!("{}/v1/{}/creds/{}", self.base_url, mount_path, role_name);

        let response = self
            .http
            .get(&url)
            .header("X-Vault-Token", token)
            .send()
            .await
            .map_err(|e| Error::engine_transport(e, "Credential issuance request failed"))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::credential_issuance(format!(
                "Issuing credentials for role '{}' on '{}' returned status {}: {}",
                role_name, mount_path, status, body
            )));
        }

        let lease: CredentialLease = response
            .json()
            .await
            .map_err(|e| Error::engine_transport(e, "Credential response was unreadable"))?;

        tracing::debug!(
            mount_path = %mount_path,
            role_name = %role_name,
            lease_id = %lease.lease_id,
            "Issued ephemeral credentials"
        );

        Ok(lease)
    }

    /// Issue credentials and confirm the engine returned usable key material.
    ///
    /// The lease itself is dropped. Connectivity tests only care that the
    /// engine can mint credentials, not what they are.
    pub async fn verify_credentials(&self, mount_path: &str, role_name: &str) -> Result<()> {
        let lease = self.issue_credentials(mount_path, role_name).await?;

        if lease.data.access_key.is_empty() || lease.data.secret_key.is_empty() {
            return Err(Error::credential_issuance(format!(
                "Engine on '{}' returned incomplete credentials",
                mount_path
            )));
        }

        Ok(())
    }

    /// Read the full engine configuration for a mount with a known role.
    pub async fn read_configuration(
        &self,
        mount_path: &str,
        role_name: &str,
    ) -> Result<crate::domain::AwsEngineSettings> {
        let (access_key, default_region) = self.read_root_config(mount_path).await?;
        let (default_lease_ttl, max_lease_ttl) = self.read_lease_ttls(mount_path).await?;
        let (credential_type, policy_arns) = self.read_role(mount_path, role_name).await?;

        Ok(crate::domain::AwsEngineSettings {
            access_key,
            default_region,
            default_lease_ttl,
            max_lease_ttl,
            role_name: role_name.to_string(),
            credential_type,
            policy_arns,
        })
    }
}
