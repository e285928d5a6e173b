//! Connection provisioning business logic
//!
//! This module coordinates the relational store and the secrets engine for
//! every connection workflow, separated from HTTP concerns. Writes that span
//! both systems commit the store only after the engine sequence succeeds and
//! unwind the engine through the compensation stack when it does not.

use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::{
    AwsConnection, AwsConnectionDetails, AwsEngineSettings, Connection, CredentialType, TestStatus,
};
use crate::errors::Error;
use crate::services::{CompensationStack, CompensationStep};
use crate::storage::{check_connection, ConnectionRepository};
use crate::vault::{CredentialLease, EngineHealth, RoleResolver, VaultClient};

/// Operational settings the workflows need beyond their inputs.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub vault_path_prefix: String,
    pub default_lease_ttl: String,
    pub max_lease_ttl: String,
    pub default_list_limit: i64,
    pub max_list_results: i64,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            vault_path_prefix: config.vault.path_prefix.clone(),
            default_lease_ttl: config.aws.default_lease_ttl(),
            max_lease_ttl: config.aws.max_lease_ttl(),
            default_list_limit: config.server.default_list_limit,
            max_list_results: config.server.max_list_results,
        }
    }
}

/// Input for creating an AWS connection.
#[derive(Clone)]
pub struct CreateAwsConnectionInput {
    pub name: String,
    pub description: String,
    pub access_key: String,
    pub secret_access_key: String,
    pub default_region: String,
    pub default_lease_ttl: String,
    pub max_lease_ttl: String,
    pub role_name: String,
    pub credential_type: CredentialType,
    pub policy_arns: Vec<String>,
}

impl std::fmt::Debug for CreateAwsConnectionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAwsConnectionInput")
            .field("name", &self.name)
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"[REDACTED]")
            .field("role_name", &self.role_name)
            .field("credential_type", &self.credential_type)
            .finish_non_exhaustive()
    }
}

/// Input for updating an AWS connection.
///
/// The access key pair is always required because the engine cannot disclose
/// the stored secret key for a partial rewrite. Empty strings on the other
/// engine fields keep the values currently on the mount. The role name is
/// not patchable.
#[derive(Clone)]
pub struct UpdateAwsConnectionInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub access_key: String,
    pub secret_access_key: String,
    pub default_region: String,
    pub default_lease_ttl: String,
    pub max_lease_ttl: String,
    pub credential_type: CredentialType,
    pub policy_arns: Vec<String>,
}

impl std::fmt::Debug for UpdateAwsConnectionInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateAwsConnectionInput")
            .field("name", &self.name)
            .field("access_key", &self.access_key)
            .field("secret_access_key", &"[REDACTED]")
            .field("credential_type", &self.credential_type)
            .finish_non_exhaustive()
    }
}

/// One page of AWS connections with their engine settings.
#[derive(Debug, Clone)]
pub struct AwsConnectionPage {
    pub skip: i64,
    pub limit: i64,
    pub total: i64,
    pub items: Vec<AwsConnectionDetails>,
}

/// One page of base connections.
#[derive(Debug, Clone)]
pub struct ConnectionPage {
    pub skip: i64,
    pub limit: i64,
    pub total: i64,
    pub items: Vec<Connection>,
}

/// Service owning the connection workflows.
pub struct ConnectionService {
    repository: ConnectionRepository,
    vault: VaultClient,
    resolver: RoleResolver,
    settings: ServiceSettings,
}

impl ConnectionService {
    /// Create a new connection service
    pub fn new(repository: ConnectionRepository, vault: VaultClient, settings: ServiceSettings) -> Self {
        let resolver = RoleResolver::new(vault.clone());
        Self { repository, vault, resolver, settings }
    }

    /// Create an AWS connection: store rows plus a dedicated engine mount.
    ///
    /// The relational transaction stays open across the engine sequence and
    /// commits last. An engine failure rolls the rows back and unwinds any
    /// engine state already created, so a failed create leaves nothing
    /// behind in either system.
    pub async fn create(&self, input: CreateAwsConnectionInput) -> Result<AwsConnectionDetails, Error> {
        input
            .credential_type
            .validate_requested_ttls(&input.default_lease_ttl, &input.max_lease_ttl)?;

        let settings = AwsEngineSettings {
            access_key: input.access_key.clone(),
            default_region: input.default_region.clone(),
            default_lease_ttl: keep_if_empty(&input.default_lease_ttl, &self.settings.default_lease_ttl),
            max_lease_ttl: keep_if_empty(&input.max_lease_ttl, &self.settings.max_lease_ttl),
            role_name: input.role_name.clone(),
            credential_type: input.credential_type,
            policy_arns: input.policy_arns.clone(),
        };
        settings.validate()?;

        let record =
            AwsConnection::new(&input.name, &input.description, &self.settings.vault_path_prefix);

        let mut tx = self.repository.begin().await?;
        if let Err(e) = ConnectionRepository::insert_pair(&mut tx, &record).await {
            rollback(tx).await;
            return Err(e);
        }

        let mut compensation = CompensationStack::new();

        if let Err(e) = self.vault.enable_engine(&record.vault_path).await {
            rollback(tx).await;
            return Err(e);
        }
        compensation.push(CompensationStep::DisableEngine {
            mount_path: record.vault_path.clone(),
        });

        if let Err(e) = self
            .apply_engine_settings(&record.vault_path, &settings, &input.secret_access_key)
            .await
        {
            rollback(tx).await;
            compensation.unwind(&self.vault).await;
            return Err(e);
        }

        if let Err(e) = tx.commit().await {
            compensation.unwind(&self.vault).await;
            return Err(Error::database(e, "Failed to commit connection create"));
        }

        info!(
            aws_connection_id = %record.id,
            connection_name = %record.connection.name,
            vault_path = %record.vault_path,
            "Created AWS connection"
        );

        Ok(AwsConnectionDetails { record, settings })
    }

    /// Update an AWS connection's engine settings and base fields.
    ///
    /// The engine configuration read up front doubles as the restore point:
    /// tune and role settings can be put back if a later step fails, while a
    /// root credential write that already landed is only warned about.
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateAwsConnectionInput,
    ) -> Result<AwsConnectionDetails, Error> {
        let mut record = self.repository.get_aws_connection(id).await?;

        let role_name = self.resolver.resolve(&record.vault_path).await?;
        let snapshot = self.vault.read_configuration(&record.vault_path, &role_name).await?;

        let merged = AwsEngineSettings {
            access_key: patch.access_key.clone(),
            default_region: keep_if_empty(&patch.default_region, &snapshot.default_region),
            default_lease_ttl: keep_if_empty(&patch.default_lease_ttl, &snapshot.default_lease_ttl),
            max_lease_ttl: keep_if_empty(&patch.max_lease_ttl, &snapshot.max_lease_ttl),
            role_name: snapshot.role_name.clone(),
            credential_type: patch.credential_type,
            policy_arns: if patch.policy_arns.is_empty() {
                snapshot.policy_arns.clone()
            } else {
                patch.policy_arns.clone()
            },
        };

        patch
            .credential_type
            .validate_requested_ttls(&patch.default_lease_ttl, &patch.max_lease_ttl)?;
        merged.validate()?;

        if let Some(name) = &patch.name {
            record.connection.name = name.clone();
        }
        if let Some(description) = &patch.description {
            record.connection.description = description.clone();
        }
        // A changed configuration invalidates any earlier positive test.
        record.connection.reset_status();

        let mut compensation = CompensationStack::new();

        self.vault
            .tune_lease_ttls(&record.vault_path, &merged.default_lease_ttl, &merged.max_lease_ttl)
            .await?;
        compensation.push(CompensationStep::RestoreEngineSettings {
            mount_path: record.vault_path.clone(),
            default_lease_ttl: snapshot.default_lease_ttl.clone(),
            max_lease_ttl: snapshot.max_lease_ttl.clone(),
            role_name: snapshot.role_name.clone(),
            credential_type: snapshot.credential_type,
            policy_arns: snapshot.policy_arns.clone(),
        });

        if let Err(e) = self
            .vault
            .write_root_credentials(
                &record.vault_path,
                &merged.access_key,
                &patch.secret_access_key,
                &merged.default_region,
            )
            .await
        {
            compensation.unwind(&self.vault).await;
            return Err(e);
        }

        if let Err(e) = self
            .vault
            .write_role(&record.vault_path, &merged.role_name, merged.credential_type, &merged.policy_arns)
            .await
        {
            self.warn_root_retained(&record.vault_path);
            compensation.unwind(&self.vault).await;
            return Err(e);
        }

        let record = match self.repository.save_pair(&record).await {
            Ok(saved) => saved,
            Err(e) => {
                self.warn_root_retained(&record.vault_path);
                compensation.unwind(&self.vault).await;
                return Err(e);
            }
        };

        info!(
            aws_connection_id = %record.id,
            connection_name = %record.connection.name,
            "Updated AWS connection"
        );

        Ok(AwsConnectionDetails { record, settings: merged })
    }

    /// Delete an AWS connection and its engine mount.
    ///
    /// The engine goes first: if the unmount fails, the transaction rolls
    /// back and the rows stay, so the delete can simply be retried.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let record = self.repository.get_aws_connection(id).await?;

        let mut tx = self.repository.begin().await?;

        if let Err(e) = self.vault.disable_engine(&record.vault_path).await {
            rollback(tx).await;
            return Err(e);
        }

        if let Err(e) = ConnectionRepository::delete_pair(&mut tx, &record).await {
            rollback(tx).await;
            return Err(e);
        }

        if let Err(e) = tx.commit().await {
            return Err(Error::database(e, "Failed to commit connection delete"));
        }

        info!(
            aws_connection_id = %record.id,
            connection_name = %record.connection.name,
            vault_path = %record.vault_path,
            "Deleted AWS connection"
        );

        Ok(())
    }

    /// Test connectivity by issuing and discarding a credential set.
    ///
    /// The outcome lands on the connection's status fields either way. A
    /// failure to persist the outcome is logged but does not override the
    /// result of the test itself.
    pub async fn test_connection(&self, id: &str) -> Result<AwsConnection, Error> {
        let mut record = self.repository.get_aws_connection(id).await?;

        let outcome = self.run_connectivity_probe(&record.vault_path).await;

        match outcome {
            Ok(()) => record.connection.mark_test_passed(),
            Err(e) => record.connection.mark_test_failed(e.to_string()),
        }

        match self.repository.save_connection(&record.connection).await {
            Ok(saved) => record.connection = saved,
            Err(e) => {
                error!(
                    error = %e,
                    connection_id = %record.connection.id,
                    "Failed to persist connectivity test outcome"
                );
            }
        }

        Ok(record)
    }

    async fn run_connectivity_probe(&self, mount_path: &str) -> Result<(), Error> {
        let role_name = self.resolver.resolve(mount_path).await?;
        self.vault.verify_credentials(mount_path, &role_name).await
    }

    /// Issue ephemeral credentials for a connection.
    ///
    /// Refused unless the latest connectivity test succeeded; the engine is
    /// not contacted at all in that case.
    pub async fn generate_credentials(&self, id: &str) -> Result<CredentialLease, Error> {
        let record = self.repository.get_aws_connection(id).await?;

        if record.connection.test_status != TestStatus::Succeeded {
            return Err(Error::not_tested(format!(
                "Connection '{}' has status '{}'",
                record.id, record.connection.test_status
            )));
        }

        let role_name = self.resolver.resolve(&record.vault_path).await?;
        let lease = self.vault.issue_credentials(&record.vault_path, &role_name).await?;

        info!(
            aws_connection_id = %record.id,
            lease_id = %lease.lease_id,
            lease_duration = lease.lease_duration,
            "Issued ephemeral credentials"
        );

        Ok(lease)
    }

    /// Get an AWS connection with its engine settings hydrated.
    pub async fn get(&self, id: &str) -> Result<AwsConnectionDetails, Error> {
        let record = self.repository.get_aws_connection(id).await?;
        let settings = self.engine_settings(&record.vault_path).await?;
        Ok(AwsConnectionDetails { record, settings })
    }

    /// List AWS connections, hydrating engine settings per item.
    pub async fn list(&self, limit: i64, skip: i64) -> Result<AwsConnectionPage, Error> {
        let records = self.repository.list_aws_connections(limit, skip).await?;

        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let settings = self.engine_settings(&record.vault_path).await?;
            items.push(AwsConnectionDetails { record, settings });
        }

        Ok(AwsConnectionPage { skip, limit, total: items.len() as i64, items })
    }

    /// List base connections of every kind.
    pub async fn list_connections(&self, limit: i64, skip: i64) -> Result<ConnectionPage, Error> {
        let items = self.repository.list_connections(limit, skip).await?;
        Ok(ConnectionPage { skip, limit, total: items.len() as i64, items })
    }

    /// Link an application to a connection.
    pub async fn link_application(
        &self,
        connection_id: &str,
        application_id: &str,
    ) -> Result<Connection, Error> {
        let mut connection = self.repository.get_connection(connection_id).await?;
        connection.link_application(application_id)?;
        let saved = self.repository.save_connection(&connection).await?;

        info!(
            connection_id = %saved.id,
            application_id = %application_id,
            "Linked application to connection"
        );

        Ok(saved)
    }

    /// Unlink an application from a connection.
    pub async fn unlink_application(
        &self,
        connection_id: &str,
        application_id: &str,
    ) -> Result<Connection, Error> {
        let mut connection = self.repository.get_connection(connection_id).await?;
        connection.unlink_application(application_id)?;
        let saved = self.repository.save_connection(&connection).await?;

        info!(
            connection_id = %saved.id,
            application_id = %application_id,
            "Unlinked application from connection"
        );

        Ok(saved)
    }

    /// Check datastore connectivity.
    pub async fn ping_datastore(&self) -> Result<(), Error> {
        check_connection(self.repository.pool()).await
    }

    /// Check secrets engine health.
    pub async fn engine_health(&self) -> Result<EngineHealth, Error> {
        self.vault.health().await
    }

    /// Resolve requested page bounds against configured limits.
    pub fn resolve_page(&self, limit: Option<i64>, skip: Option<i64>) -> Result<(i64, i64), Error> {
        let limit = limit.unwrap_or(self.settings.default_list_limit);
        if limit <= 0 {
            return Err(Error::validation("Limit must be a positive integer"));
        }

        let skip = skip.unwrap_or(0);
        if skip < 0 {
            return Err(Error::validation("Skip must not be negative"));
        }

        Ok((limit.min(self.settings.max_list_results), skip))
    }

    async fn engine_settings(&self, mount_path: &str) -> Result<AwsEngineSettings, Error> {
        let role_name = self.resolver.resolve(mount_path).await?;
        self.vault.read_configuration(mount_path, &role_name).await
    }

    async fn apply_engine_settings(
        &self,
        mount_path: &str,
        settings: &AwsEngineSettings,
        secret_access_key: &str,
    ) -> Result<(), Error> {
        self.vault
            .tune_lease_ttls(mount_path, &settings.default_lease_ttl, &settings.max_lease_ttl)
            .await?;
        self.vault
            .write_root_credentials(
                mount_path,
                &settings.access_key,
                secret_access_key,
                &settings.default_region,
            )
            .await?;
        self.vault
            .write_role(mount_path, &settings.role_name, settings.credential_type, &settings.policy_arns)
            .await
    }

    fn warn_root_retained(&self, mount_path: &str) {
        warn!(
            mount_path = %mount_path,
            "Mount retains root credentials written before the failure; they cannot be read back or restored"
        );
    }
}

fn keep_if_empty(requested: &str, current: &str) -> String {
    if requested.is_empty() {
        current.to_string()
    } else {
        requested.to_string()
    }
}

async fn rollback(tx: sqlx::Transaction<'static, sqlx::Sqlite>) {
    if let Err(e) = tx.rollback().await {
        error!(error = %e, "Failed to roll back transaction");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret_material() {
        let input = CreateAwsConnectionInput {
            name: "prod-account".to_string(),
            description: String::new(),
            access_key: "AKIAEXAMPLE".to_string(),
            secret_access_key: "super-secret".to_string(),
            default_region: String::new(),
            default_lease_ttl: String::new(),
            max_lease_ttl: String::new(),
            role_name: "deploy-role".to_string(),
            credential_type: CredentialType::IamUser,
            policy_arns: vec![],
        };
        let rendered = format!("{:?}", input);
        assert!(rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("super-secret"));

        let patch = UpdateAwsConnectionInput {
            name: None,
            description: None,
            access_key: "AKIAEXAMPLE".to_string(),
            secret_access_key: "super-secret".to_string(),
            default_region: String::new(),
            default_lease_ttl: String::new(),
            max_lease_ttl: String::new(),
            credential_type: CredentialType::IamUser,
            policy_arns: vec![],
        };
        let rendered = format!("{:?}", patch);
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_keep_if_empty() {
        assert_eq!(keep_if_empty("", "600s"), "600s");
        assert_eq!(keep_if_empty("1200s", "600s"), "1200s");
    }
}
