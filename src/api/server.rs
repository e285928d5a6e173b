use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{config::ServerConfig, errors::Error, services::ConnectionService};

use super::routes::build_router;

pub async fn start_api_server(
    config: &ServerConfig,
    connection_service: Arc<ConnectionService>,
) -> crate::Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| Error::config(format!("Invalid API address: {}", e)))?;

    let router: Router = build_router(connection_service);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind API server: {}", e)))?;

    info!(address = %addr, "Starting HTTP API server");
    run_http_server(listener, router).await?;

    info!("API server shutdown completed");
    Ok(())
}

async fn run_http_server(listener: TcpListener, router: Router) -> crate::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "API server shutdown listener failed");
            }
        })
        .await
        .map_err(|e| Error::transport(format!("API server error: {}", e)))
}
