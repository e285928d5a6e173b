//! Manual migration runner for SQLite
//!
//! Connects to the configured SQLite database, runs all pending migrations,
//! validates the applied set against the migration files, and prints what is
//! on the database. Usage: cargo run --bin run_migrations
//!
//! Set DATABASE_URL to specify the target database.
//! Defaults to sqlite://./data/cloudlink.db

use cloudlink::{config::DatabaseConfig, storage::create_pool};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("Running database migrations");

    let db_config = DatabaseConfig {
        url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/cloudlink.db".to_string()),
        max_connections: 5,
        auto_migrate: false, // We'll do it manually below
        ..Default::default()
    };

    let pool = create_pool(&db_config).await?;
    info!("Connected to database");

    info!("Starting migration process...");
    cloudlink::storage::run_migrations(&pool).await?;

    if !cloudlink::storage::validate_migrations(&pool).await? {
        return Err("applied migrations do not match the migration files".into());
    }

    // Verify tables were created
    let tables = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;

    info!("Tables in database: {:?}", tables);

    let applied = cloudlink::storage::list_applied_migrations(&pool).await?;
    for migration in &applied {
        info!(
            version = migration.version,
            execution_time_ms = migration.execution_time,
            "Applied migration: {}",
            migration.description
        );
    }

    info!("Migrations applied: {}", applied.len());
    info!("Migration completed successfully");

    Ok(())
}
