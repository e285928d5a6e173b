//! Service and router builders wired to a test database and engine stub.

#![allow(clippy::duplicate_mod)]

use std::sync::Arc;

use cloudlink::api::build_router;
use cloudlink::domain::CredentialType;
use cloudlink::services::{ConnectionService, CreateAwsConnectionInput, ServiceSettings};
use cloudlink::storage::ConnectionRepository;
use cloudlink::vault::VaultClient;

use super::engine_stub::{EngineStub, ROOT_ACCESS_KEY, ROOT_SECRET_KEY, TEST_ROLE};
use super::test_db::TestDatabase;

pub const TEST_POLICY_ARN: &str = "arn:aws:iam::123456789012:policy/deploy";

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        vault_path_prefix: "cloudlink".to_string(),
        default_lease_ttl: "3600s".to_string(),
        max_lease_ttl: "14400s".to_string(),
        default_list_limit: 50,
        max_list_results: 500,
    }
}

pub fn connection_service(db: &TestDatabase, stub: &EngineStub) -> ConnectionService {
    let vault = VaultClient::new(&stub.config()).expect("vault client");
    ConnectionService::new(ConnectionRepository::new(db.pool().clone()), vault, test_settings())
}

pub fn api_server(db: &TestDatabase, stub: &EngineStub) -> axum_test::TestServer {
    let service = Arc::new(connection_service(db, stub));
    axum_test::TestServer::new(build_router(service)).expect("test server")
}

/// Service-level create input aligned with the stub's canned engine state.
pub fn create_input(name: &str) -> CreateAwsConnectionInput {
    CreateAwsConnectionInput {
        name: name.to_string(),
        description: "integration test account".to_string(),
        access_key: ROOT_ACCESS_KEY.to_string(),
        secret_access_key: ROOT_SECRET_KEY.to_string(),
        default_region: "eu-west-1".to_string(),
        default_lease_ttl: String::new(),
        max_lease_ttl: String::new(),
        role_name: TEST_ROLE.to_string(),
        credential_type: CredentialType::IamUser,
        policy_arns: vec![TEST_POLICY_ARN.to_string()],
    }
}

/// HTTP create payload aligned with the stub's canned engine state.
pub fn create_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "connection": {"name": name, "description": "integration test account"},
        "accessKey": ROOT_ACCESS_KEY,
        "secretAccessKey": ROOT_SECRET_KEY,
        "defaultRegion": "eu-west-1",
        "roleName": TEST_ROLE,
        "credentialType": "iam_user",
        "policyArns": [TEST_POLICY_ARN]
    })
}
