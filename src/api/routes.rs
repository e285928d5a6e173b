use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::services::ConnectionService;

use super::{
    docs,
    handlers::{
        create_aws_connection_handler, delete_aws_connection_handler,
        generate_aws_credentials_handler, get_aws_connection_handler, link_application_handler,
        list_aws_connections_handler, list_connections_handler, status_handler,
        test_aws_connection_handler, unlink_application_handler, update_aws_connection_handler,
    },
    request_id::propagate_request_id,
};

#[derive(Clone)]
pub struct ApiState {
    pub connection_service: Arc<ConnectionService>,
}

pub fn build_router(connection_service: Arc<ConnectionService>) -> Router {
    let api_state = ApiState { connection_service };

    Router::new()
        .route("/v1/connectionmgmt/status", get(status_handler))
        .route("/v1/connectionmgmt/connections", get(list_connections_handler))
        .route("/v1/connectionmgmt/connections/aws", get(list_aws_connections_handler))
        .route("/v1/connectionmgmt/connection/aws", post(create_aws_connection_handler))
        .route(
            "/v1/connectionmgmt/connection/aws/{id}",
            get(get_aws_connection_handler)
                .patch(update_aws_connection_handler)
                .delete(delete_aws_connection_handler),
        )
        .route("/v1/connectionmgmt/connection/aws/{id}/test", get(test_aws_connection_handler))
        .route(
            "/v1/connectionmgmt/connection/aws/{id}/creds",
            get(generate_aws_credentials_handler),
        )
        .route(
            "/v1/connectionmgmt/connection/{id}/link/{application_id}",
            post(link_application_handler),
        )
        .route(
            "/v1/connectionmgmt/connection/{id}/unlink/{application_id}",
            post(unlink_application_handler),
        )
        .with_state(api_state)
        .merge(docs::docs_router())
        .layer(middleware::from_fn(propagate_request_id))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::config::{DatabaseConfig, VaultConfig};
    use crate::services::{ConnectionService, ServiceSettings};
    use crate::storage::{create_pool, ConnectionRepository};
    use crate::vault::VaultClient;

    async fn test_router(dir: &TempDir) -> Router {
        let db_path = dir.path().join("routes_test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 5,
            auto_migrate: true,
            ..Default::default()
        };
        let pool = create_pool(&config).await.expect("create pool");

        let vault = VaultClient::new(&VaultConfig {
            host: "127.0.0.1".to_string(),
            port: Some(9),
            https: false,
            tls_skip_verify: false,
            role_id: "test-role-id".to_string(),
            secret_id: "test-secret-id".to_string(),
            path_prefix: "cloudlink".to_string(),
        })
        .expect("vault client");

        let settings = ServiceSettings {
            vault_path_prefix: "cloudlink".to_string(),
            default_lease_ttl: "3600s".to_string(),
            max_lease_ttl: "14400s".to_string(),
            default_list_limit: 50,
            max_list_results: 500,
        };

        let service = ConnectionService::new(ConnectionRepository::new(pool), vault, settings);
        build_router(Arc::new(service))
    }

    #[tokio::test]
    async fn test_status_route_carries_request_id() {
        let dir = TempDir::new().expect("tempdir");
        let server = axum_test::TestServer::new(test_router(&dir).await).expect("test server");

        let response = server.get("/v1/connectionmgmt/status").await;
        response.assert_status_ok();
        assert!(response.headers().contains_key("x-request-id"));

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "UP");
        assert_eq!(body["secretsEngine"], "unreachable");
    }

    #[tokio::test]
    async fn test_request_id_is_preserved_when_supplied() {
        let dir = TempDir::new().expect("tempdir");
        let server = axum_test::TestServer::new(test_router(&dir).await).expect("test server");

        let response = server
            .get("/v1/connectionmgmt/status")
            .add_header("x-request-id", axum::http::HeaderValue::from_static("req-12345"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.headers()["x-request-id"], "req-12345");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let server = axum_test::TestServer::new(test_router(&dir).await).expect("test server");

        let response = server.get("/v1/connectionmgmt/nothing-here").await;
        assert_eq!(response.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
