use std::sync::Arc;

use cloudlink::{
    api::start_api_server,
    config::{AppConfig, ObservabilityConfig},
    observability::init_observability,
    services::{ConnectionService, ServiceSettings},
    storage::{create_pool, ConnectionRepository},
    vault::VaultClient,
    Result, APP_NAME, VERSION,
};
use tracing::info;

fn install_rustls_provider() {
    use rustls::crypto::{ring, CryptoProvider};

    if CryptoProvider::get_default().is_none() {
        ring::default_provider().install_default().expect("install ring crypto provider");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_rustls_provider();

    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        // Only warn if the error is NOT "file not found"
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let observability_config = ObservabilityConfig::from_env();
    init_observability(&observability_config)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting Cloudlink connection manager");

    // Load configuration from environment variables
    let config = AppConfig::from_env()?;
    info!(
        api_address = %config.server.bind_address(),
        vault_address = %config.vault.base_url(),
        "Loaded configuration from environment"
    );

    // Initialize database configuration and pool
    let db_kind = if config.database.is_sqlite() { "sqlite" } else { "database" };
    info!(database = db_kind, "Creating database connection pool");
    let pool = create_pool(&config.database).await?;

    // The secrets engine must be reachable before the API starts serving.
    let vault = VaultClient::new(&config.vault)?;
    let health = vault.health().await?;
    info!(engine_health = ?health, "Secrets engine reachable");

    let settings = ServiceSettings::from_config(&config);
    let repository = ConnectionRepository::new(pool);
    let service = Arc::new(ConnectionService::new(repository, vault, settings));

    start_api_server(&config.server, service).await
}
