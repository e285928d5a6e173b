//! # Repository Pattern for Data Access
//!
//! Provides the connection repository using runtime queries with structured
//! row types. A connection is stored as a pair of rows: the base record in
//! `connections` and the engine binding in `aws_connections`. Pair writes run
//! inside caller-supplied transactions so the provisioning workflow can
//! coordinate them with secrets engine calls.

use crate::domain::{AwsConnection, Connection};
use crate::errors::{Error, Result};
use crate::storage::DbPool;
use sqlx::{FromRow, Sqlite, Transaction};

/// Database row structure for connections
#[derive(Debug, Clone, FromRow)]
struct ConnectionRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub connection_kind: String,
    pub test_status: String,
    pub test_error: String,
    pub tested_on: String,
    pub last_successful_test: String,
    pub applications: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<ConnectionRow> for Connection {
    type Error = Error;

    fn try_from(row: ConnectionRow) -> Result<Self> {
        Ok(Self {
            kind: row
                .connection_kind
                .parse()
                .map_err(|e: String| Error::internal(format!("Stored connection invalid: {}", e)))?,
            test_status: row
                .test_status
                .parse()
                .map_err(|e: String| Error::internal(format!("Stored connection invalid: {}", e)))?,
            applications: applications_from_json(&row.applications)?,
            id: row.id,
            name: row.name,
            description: row.description,
            test_error: row.test_error,
            tested_on: row.tested_on,
            last_successful_test: row.last_successful_test,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row structure for the aws_connections/connections join
#[derive(Debug, Clone, FromRow)]
struct AwsConnectionJoinRow {
    pub id: String,
    pub connection_id: String,
    pub vault_path: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub name: String,
    pub description: String,
    pub connection_kind: String,
    pub test_status: String,
    pub test_error: String,
    pub tested_on: String,
    pub last_successful_test: String,
    pub applications: String,
    pub connection_created_at: chrono::DateTime<chrono::Utc>,
    pub connection_updated_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<AwsConnectionJoinRow> for AwsConnection {
    type Error = Error;

    fn try_from(row: AwsConnectionJoinRow) -> Result<Self> {
        let connection = Connection {
            id: row.connection_id.clone(),
            name: row.name,
            description: row.description,
            kind: row
                .connection_kind
                .parse()
                .map_err(|e: String| Error::internal(format!("Stored connection invalid: {}", e)))?,
            test_status: row
                .test_status
                .parse()
                .map_err(|e: String| Error::internal(format!("Stored connection invalid: {}", e)))?,
            test_error: row.test_error,
            tested_on: row.tested_on,
            last_successful_test: row.last_successful_test,
            applications: applications_from_json(&row.applications)?,
            created_at: row.connection_created_at,
            updated_at: row.connection_updated_at,
        };

        Ok(Self {
            id: row.id,
            connection_id: row.connection_id,
            vault_path: row.vault_path,
            created_at: row.created_at,
            updated_at: row.updated_at,
            connection,
        })
    }
}

fn applications_to_json(applications: &[String]) -> Result<String> {
    serde_json::to_string(applications)
        .map_err(|e| Error::internal(format!("Failed to serialize application links: {}", e)))
}

fn applications_from_json(raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::internal(format!("Stored application links are invalid: {}", e)))
}

/// Repository for connection data access
#[derive(Debug, Clone)]
pub struct ConnectionRepository {
    pool: DbPool,
}

impl ConnectionRepository {
    /// Create a new connection repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Access the underlying pool (used by health checks)
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Start a transaction for a multi-step write
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool.begin().await.map_err(|e| Error::database(e, "Failed to start transaction"))
    }

    /// Insert a connection pair inside a caller-owned transaction
    pub async fn insert_pair(
        tx: &mut Transaction<'_, Sqlite>,
        record: &AwsConnection,
    ) -> Result<()> {
        let applications = applications_to_json(&record.connection.applications)?;

        let result = sqlx::query(
            "INSERT INTO connections (id, name, description, connection_kind, test_status, test_error, tested_on, last_successful_test, applications, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        )
        .bind(&record.connection.id)
        .bind(&record.connection.name)
        .bind(&record.connection.description)
        .bind(record.connection.kind.as_str())
        .bind(record.connection.test_status.as_str())
        .bind(&record.connection.test_error)
        .bind(&record.connection.tested_on)
        .bind(&record.connection.last_successful_test)
        .bind(&applications)
        .bind(record.connection.created_at)
        .bind(record.connection.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, connection_name = %record.connection.name, "Failed to insert connection");
            Error::database(e, format!("Failed to insert connection '{}'", record.connection.name))
        })?;

        if result.rows_affected() != 1 {
            return Err(Error::unexpected_row_count(format!(
                "Inserting connection '{}' affected {} rows",
                record.connection.name,
                result.rows_affected()
            )));
        }

        let result = sqlx::query(
            "INSERT INTO aws_connections (id, connection_id, vault_path, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)"
        )
        .bind(&record.id)
        .bind(&record.connection_id)
        .bind(&record.vault_path)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, aws_connection_id = %record.id, "Failed to insert AWS connection");
            Error::database(e, format!("Failed to insert AWS connection '{}'", record.id))
        })?;

        if result.rows_affected() != 1 {
            return Err(Error::unexpected_row_count(format!(
                "Inserting AWS connection '{}' affected {} rows",
                record.id,
                result.rows_affected()
            )));
        }

        Ok(())
    }

    /// Delete a connection pair inside a caller-owned transaction.
    ///
    /// The AWS row goes first so the foreign key constraint holds at every
    /// point of the transaction. Each delete must touch exactly one row.
    pub async fn delete_pair(
        tx: &mut Transaction<'_, Sqlite>,
        record: &AwsConnection,
    ) -> Result<()> {
        let result = sqlx::query("DELETE FROM aws_connections WHERE id = $1")
            .bind(&record.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, aws_connection_id = %record.id, "Failed to delete AWS connection");
                Error::database(e, format!("Failed to delete AWS connection '{}'", record.id))
            })?;

        if result.rows_affected() != 1 {
            return Err(Error::unexpected_row_count(format!(
                "Deleting AWS connection '{}' affected {} rows",
                record.id,
                result.rows_affected()
            )));
        }

        let result = sqlx::query("DELETE FROM connections WHERE id = $1")
            .bind(&record.connection_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, connection_id = %record.connection_id, "Failed to delete connection");
                Error::database(e, format!("Failed to delete connection '{}'", record.connection_id))
            })?;

        if result.rows_affected() != 1 {
            return Err(Error::unexpected_row_count(format!(
                "Deleting connection '{}' affected {} rows",
                record.connection_id,
                result.rows_affected()
            )));
        }

        Ok(())
    }

    /// Get an AWS connection by ID, joined with its base record
    pub async fn get_aws_connection(&self, id: &str) -> Result<AwsConnection> {
        let row = sqlx::query_as::<Sqlite, AwsConnectionJoinRow>(
            "SELECT a.id, a.connection_id, a.vault_path, a.created_at, a.updated_at, c.name, c.description, c.connection_kind, c.test_status, c.test_error, c.tested_on, c.last_successful_test, c.applications, c.created_at AS connection_created_at, c.updated_at AS connection_updated_at FROM aws_connections a JOIN connections c ON c.id = a.connection_id WHERE a.id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, aws_connection_id = %id, "Failed to get AWS connection");
            Error::database(e, format!("Failed to get AWS connection with ID '{}'", id))
        })?;

        match row {
            Some(row) => AwsConnection::try_from(row),
            None => Err(Error::not_found(format!("AWS connection with ID '{}' not found", id))),
        }
    }

    /// List AWS connections ordered by connection name
    pub async fn list_aws_connections(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AwsConnection>> {
        let rows = sqlx::query_as::<Sqlite, AwsConnectionJoinRow>(
            "SELECT a.id, a.connection_id, a.vault_path, a.created_at, a.updated_at, c.name, c.description, c.connection_kind, c.test_status, c.test_error, c.tested_on, c.last_successful_test, c.applications, c.created_at AS connection_created_at, c.updated_at AS connection_updated_at FROM aws_connections a JOIN connections c ON c.id = a.connection_id ORDER BY c.name LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list AWS connections");
            Error::database(e, "Failed to list AWS connections")
        })?;

        rows.into_iter().map(AwsConnection::try_from).collect()
    }

    /// Get AWS connection count
    pub async fn count_aws_connections(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM aws_connections")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to get AWS connection count");
                Error::database(e, "Failed to get AWS connection count")
            })?;

        Ok(count)
    }

    /// Get a base connection by ID
    pub async fn get_connection(&self, id: &str) -> Result<Connection> {
        let row = sqlx::query_as::<Sqlite, ConnectionRow>(
            "SELECT id, name, description, connection_kind, test_status, test_error, tested_on, last_successful_test, applications, created_at, updated_at FROM connections WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, connection_id = %id, "Failed to get connection");
            Error::database(e, format!("Failed to get connection with ID '{}'", id))
        })?;

        match row {
            Some(row) => Connection::try_from(row),
            None => Err(Error::not_found(format!("Connection with ID '{}' not found", id))),
        }
    }

    /// List base connections of every kind, ordered by name
    pub async fn list_connections(&self, limit: i64, offset: i64) -> Result<Vec<Connection>> {
        let rows = sqlx::query_as::<Sqlite, ConnectionRow>(
            "SELECT id, name, description, connection_kind, test_status, test_error, tested_on, last_successful_test, applications, created_at, updated_at FROM connections ORDER BY name LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list connections");
            Error::database(e, "Failed to list connections")
        })?;

        rows.into_iter().map(Connection::try_from).collect()
    }

    /// Get base connection count
    pub async fn count_connections(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM connections")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to get connection count");
                Error::database(e, "Failed to get connection count")
            })?;

        Ok(count)
    }

    /// Persist the mutable fields of a base connection
    pub async fn save_connection(&self, connection: &Connection) -> Result<Connection> {
        let applications = applications_to_json(&connection.applications)?;
        let now = chrono::Utc::now();

        let result = sqlx::query(
            "UPDATE connections SET name = $1, description = $2, test_status = $3, test_error = $4, tested_on = $5, last_successful_test = $6, applications = $7, updated_at = $8 WHERE id = $9"
        )
        .bind(&connection.name)
        .bind(&connection.description)
        .bind(connection.test_status.as_str())
        .bind(&connection.test_error)
        .bind(&connection.tested_on)
        .bind(&connection.last_successful_test)
        .bind(&applications)
        .bind(now)
        .bind(&connection.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, connection_id = %connection.id, "Failed to save connection");
            Error::database(e, format!("Failed to save connection '{}'", connection.id))
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!(
                "Connection with ID '{}' not found",
                connection.id
            )));
        }

        tracing::info!(
            connection_id = %connection.id,
            test_status = %connection.test_status,
            "Saved connection"
        );

        self.get_connection(&connection.id).await
    }

    /// Persist a connection pair after an update, bumping both timestamps
    pub async fn save_pair(&self, record: &AwsConnection) -> Result<AwsConnection> {
        let applications = applications_to_json(&record.connection.applications)?;
        let now = chrono::Utc::now();

        let mut tx = self.begin().await?;

        let result = sqlx::query(
            "UPDATE connections SET name = $1, description = $2, test_status = $3, test_error = $4, tested_on = $5, last_successful_test = $6, applications = $7, updated_at = $8 WHERE id = $9"
        )
        .bind(&record.connection.name)
        .bind(&record.connection.description)
        .bind(record.connection.test_status.as_str())
        .bind(&record.connection.test_error)
        .bind(&record.connection.tested_on)
        .bind(&record.connection.last_successful_test)
        .bind(&applications)
        .bind(now)
        .bind(&record.connection.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, connection_id = %record.connection.id, "Failed to save connection");
            Error::database(e, format!("Failed to save connection '{}'", record.connection.id))
        })?;

        if result.rows_affected() != 1 {
            return Err(Error::unexpected_row_count(format!(
                "Saving connection '{}' affected {} rows",
                record.connection.id,
                result.rows_affected()
            )));
        }

        let result = sqlx::query("UPDATE aws_connections SET updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(&record.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, aws_connection_id = %record.id, "Failed to save AWS connection");
                Error::database(e, format!("Failed to save AWS connection '{}'", record.id))
            })?;

        if result.rows_affected() != 1 {
            return Err(Error::unexpected_row_count(format!(
                "Saving AWS connection '{}' affected {} rows",
                record.id,
                result.rows_affected()
            )));
        }

        tx.commit().await.map_err(|e| Error::database(e, "Failed to commit connection save"))?;

        tracing::info!(
            aws_connection_id = %record.id,
            connection_name = %record.connection.name,
            "Saved connection pair"
        );

        self.get_aws_connection(&record.id).await
    }
}
