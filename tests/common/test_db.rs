//! Test database utilities for integration tests.
//!
//! Provides file-based SQLite databases in per-test temporary directories so
//! every test gets an isolated, migrated schema.

#![allow(clippy::duplicate_mod)]

use std::path::PathBuf;

use cloudlink::config::DatabaseConfig;
use cloudlink::storage::{create_pool, DbPool};
use tempfile::TempDir;

/// A migrated SQLite database living in its own temporary directory.
///
/// The directory, and the database file with it, is removed when this struct
/// is dropped.
pub struct TestDatabase {
    pub pool: DbPool,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestDatabase {
    /// Create a new test database with migrations applied.
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("create test directory");
        let path = dir.path().join("cloudlink_test.db");

        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 5,
            auto_migrate: true,
            ..Default::default()
        };
        let pool = create_pool(&config).await.expect("create test database pool");

        Self { pool, path, _dir: dir }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Bytes of the database file with the WAL checkpointed into it first.
    pub async fn file_bytes(&self) -> Vec<u8> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .expect("checkpoint WAL");

        let mut bytes = std::fs::read(&self.path).expect("read database file");
        if let Ok(mut wal) = std::fs::read(self.path.with_extension("db-wal")) {
            bytes.append(&mut wal);
        }
        bytes
    }

    /// Check whether the database file contains the given byte sequence.
    pub async fn file_contains(&self, needle: &str) -> bool {
        let bytes = self.file_bytes().await;
        bytes.windows(needle.len()).any(|window| window == needle.as_bytes())
    }
}
