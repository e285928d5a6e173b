//! # Storage and Persistence
//!
//! This module provides database connectivity and the persistence layer for
//! connection records. Secret material never passes through this layer.

pub mod migrations;
pub mod pool;
pub mod repository;

pub use crate::config::DatabaseConfig;

pub use migrations::{
    get_migration_version, list_applied_migrations, run_migrations as run_db_migrations,
    validate_migrations, MigrationInfo,
};
pub use pool::{create_pool, get_pool_stats, DbPool, PoolStats};
pub use repository::ConnectionRepository;

use crate::errors::{Error, Result};

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    migrations::run_migrations(pool).await
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map_err(|e| Error::database(e, "Database connectivity check failed"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_pool_and_check_connection() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("pool creation should succeed");
        check_connection(&pool).await.expect("connectivity check should succeed");
    }

    #[tokio::test]
    async fn test_run_migrations_in_memory() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("pool creation should succeed");
        run_migrations(&pool).await.expect("migrations should succeed");

        let version = get_migration_version(&pool).await.expect("version query should succeed");
        assert_eq!(version, 20250301000001);
    }

    #[tokio::test]
    async fn test_validate_and_list_applied_migrations() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("pool creation should succeed");

        // Fresh database: nothing applied yet.
        assert!(!validate_migrations(&pool).await.expect("validation should succeed"));
        assert!(list_applied_migrations(&pool).await.expect("listing should succeed").is_empty());

        run_migrations(&pool).await.expect("migrations should succeed");

        assert!(validate_migrations(&pool).await.expect("validation should succeed"));

        let applied = list_applied_migrations(&pool).await.expect("listing should succeed");
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].version, 20250301000001);
        assert_eq!(applied[0].description, "20250301000001_create_connections_tables");
        assert!(!applied[0].checksum.is_empty());
    }

    #[tokio::test]
    async fn test_validate_migrations_detects_unexpected_version() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("pool creation should succeed");
        run_migrations(&pool).await.expect("migrations should succeed");

        // A version recorded on the database but absent from the tree.
        sqlx::query(
            "INSERT INTO _cloudlink_migrations (version, description, checksum, execution_time) VALUES ($1, $2, $3, $4)",
        )
        .bind(99990101000000i64)
        .bind("99990101000000_removed_migration")
        .bind(vec![0u8])
        .bind(0i64)
        .execute(&pool)
        .await
        .expect("insert should succeed");

        assert!(!validate_migrations(&pool).await.expect("validation should succeed"));
    }

    #[tokio::test]
    async fn test_pool_stats() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            auto_migrate: false,
            ..Default::default()
        };

        let pool = create_pool(&config).await.expect("pool creation should succeed");
        let stats = get_pool_stats(&pool);
        assert!(stats.size >= 1);
    }
}
