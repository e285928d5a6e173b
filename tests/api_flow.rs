//! End-to-end tests over the HTTP surface.
//!
//! Drives the full router with axum-test against a migrated SQLite database
//! and a stubbed secrets engine, asserting response bodies, status codes,
//! and error envelopes as a client would see them.

use axum::http::StatusCode;
use uuid::Uuid;

#[allow(clippy::duplicate_mod)]
#[path = "common/mod.rs"]
mod common;

use common::engine_stub::{
    self, EngineStub, ISSUED_ACCESS_KEY, ISSUED_SECRET_KEY, ROOT_ACCESS_KEY, ROOT_SECRET_KEY,
    TEST_ROLE,
};
use common::fixtures::{api_server, create_body, TEST_POLICY_ARN};
use common::test_db::TestDatabase;

async fn create_connection(server: &axum_test::TestServer, name: &str) -> serde_json::Value {
    let response = server.post("/v1/connectionmgmt/connection/aws").json(&create_body(name)).await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn create_returns_the_provisioned_connection() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let response =
        server.post("/v1/connectionmgmt/connection/aws").json(&create_body("prod-billing")).await;
    response.assert_status(StatusCode::CREATED);
    assert!(response.headers().contains_key("x-request-id"));

    // The payload carries everything except the secret key.
    assert!(!response.text().contains(ROOT_SECRET_KEY));

    let body: serde_json::Value = response.json();
    assert!(Uuid::parse_str(body["id"].as_str().expect("id")).is_ok());
    assert!(Uuid::parse_str(body["connectionId"].as_str().expect("connectionId")).is_ok());
    assert_eq!(body["connection"]["name"], "prod-billing");
    assert_eq!(body["connection"]["connectionKind"], "aws");
    assert_eq!(body["connection"]["testStatus"], "not_tested");
    assert_eq!(body["accessKey"], ROOT_ACCESS_KEY);
    assert_eq!(body["roleName"], TEST_ROLE);
    assert_eq!(body["credentialType"], "iam_user");
    assert_eq!(body["defaultLeaseTtl"], "3600s");
    assert_eq!(body["maxLeaseTtl"], "14400s");
}

#[tokio::test]
async fn get_hydrates_settings_from_the_engine() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let created = create_connection(&server, "prod-billing").await;
    let id = created["id"].as_str().expect("id").to_string();

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}", id)).await;
    response.assert_status_ok();
    assert!(!response.text().contains(ROOT_SECRET_KEY));

    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["accessKey"], ROOT_ACCESS_KEY);
    assert_eq!(body["defaultRegion"], "eu-west-1");
    assert_eq!(body["maxLeaseTtl"], "14400s");
    assert_eq!(body["policyArns"][0], TEST_POLICY_ARN);
}

#[tokio::test]
async fn list_pages_echo_their_bounds() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    create_connection(&server, "alpha").await;
    create_connection(&server, "beta").await;

    let response = server.get("/v1/connectionmgmt/connections/aws?limit=1&skip=1").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["limit"], 1);
    assert_eq!(body["skip"], 1);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"].as_array().expect("items").len(), 1);

    let response = server.get("/v1/connectionmgmt/connections").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["connectionKind"], "aws");
}

#[tokio::test]
async fn update_resets_the_test_status() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let created = create_connection(&server, "prod-billing").await;
    let id = created["id"].as_str().expect("id").to_string();

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}/test", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["testStatusCode"], "succeeded");
    assert_eq!(body["testStatus"], "");

    let patch = serde_json::json!({
        "connection": {"description": "rotated keys"},
        "accessKey": ROOT_ACCESS_KEY,
        "secretAccessKey": ROOT_SECRET_KEY,
        "credentialType": "iam_user"
    });
    let response =
        server.patch(&format!("/v1/connectionmgmt/connection/aws/{}", id)).json(&patch).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["connection"]["testStatus"], "not_tested");
    assert_eq!(body["connection"]["description"], "rotated keys");
    assert_eq!(body["connection"]["name"], "prod-billing");
}

#[tokio::test]
async fn delete_answers_with_a_status_body() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let created = create_connection(&server, "prod-billing").await;
    let id = created["id"].as_str().expect("id").to_string();

    let response = server.delete(&format!("/v1/connectionmgmt/connection/aws/{}", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "No Content");
    assert_eq!(body["statusCode"], 204);

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}", id)).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn credentials_are_gated_on_a_passing_test() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let created = create_connection(&server, "prod-billing").await;
    let id = created["id"].as_str().expect("id").to_string();

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}/creds", id)).await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "not_tested_successfully");

    server.get(&format!("/v1/connectionmgmt/connection/aws/{}/test", id)).await.assert_status_ok();

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}/creds", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["accessKey"], ISSUED_ACCESS_KEY);
    assert_eq!(body["secretKey"], ISSUED_SECRET_KEY);
    assert!(body["leaseId"].as_str().expect("leaseId").contains("/creds/"));
    assert_eq!(body["leaseDuration"], 3600);
    assert_eq!(body["renewable"], true);
    assert!(body["securityToken"].is_null());
}

#[tokio::test]
async fn failed_probe_marks_the_connection() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let created = create_connection(&server, "prod-billing").await;
    let id = created["id"].as_str().expect("id").to_string();

    stub.server.reset().await;
    engine_stub::mount_failure(&stub.server, "GET", engine_stub::CREDS_ROUTE, 403).await;
    engine_stub::mount_defaults(&stub.server).await;

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}/test", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["testStatusCode"], "failed");
    assert!(!body["testStatus"].as_str().expect("testStatus").is_empty());

    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["connection"]["testStatus"], "failed");
    assert!(!body["connection"]["testError"].as_str().expect("testError").is_empty());
}

#[tokio::test]
async fn invalid_payloads_get_the_error_envelope() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    // Empty access key fails field validation.
    let mut body = create_body("prod-billing");
    body["accessKey"] = serde_json::json!("");
    let response = server.post("/v1/connectionmgmt/connection/aws").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let envelope: serde_json::Value = response.json();
    assert_eq!(envelope["error"], "validation_error");

    // iam_user roles need at least one policy ARN.
    let mut body = create_body("prod-billing");
    body["policyArns"] = serde_json::json!([]);
    let response = server.post("/v1/connectionmgmt/connection/aws").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let envelope: serde_json::Value = response.json();
    assert_eq!(envelope["error"], "invalid_policy_arns");

    // session_token roles cannot carry caller TTLs.
    let mut body = create_body("prod-billing");
    body["credentialType"] = serde_json::json!("session_token");
    body["defaultLeaseTtl"] = serde_json::json!("3600s");
    let response = server.post("/v1/connectionmgmt/connection/aws").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let envelope: serde_json::Value = response.json();
    assert_eq!(envelope["error"], "invalid_lease_ttl");

    // None of the rejected attempts left rows behind.
    let response = server.get("/v1/connectionmgmt/connections").await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn malformed_and_unknown_ids_are_rejected() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let response = server.get("/v1/connectionmgmt/connection/aws/not-a-uuid").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "bad_request");

    let response =
        server.get(&format!("/v1/connectionmgmt/connection/aws/{}", Uuid::new_v4())).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn duplicate_names_are_conflicts() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    create_connection(&server, "prod-billing").await;

    let response =
        server.post("/v1/connectionmgmt/connection/aws").json(&create_body("prod-billing")).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn rename_to_a_taken_name_is_a_conflict() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    create_connection(&server, "alpha").await;
    let created = create_connection(&server, "beta").await;
    let id = created["id"].as_str().expect("id").to_string();

    let patch = serde_json::json!({
        "connection": {"name": "alpha"},
        "accessKey": ROOT_ACCESS_KEY,
        "secretAccessKey": ROOT_SECRET_KEY,
        "defaultLeaseTtl": "600s",
        "credentialType": "iam_user"
    });
    let response =
        server.patch(&format!("/v1/connectionmgmt/connection/aws/{}", id)).json(&patch).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "conflict");

    // The failed save put the snapshot TTLs back on the mount.
    let tune_bodies = stub.request_bodies("POST", "/tune").await;
    assert_eq!(tune_bodies.len(), 4);
    assert_eq!(tune_bodies[2]["default_lease_ttl"], "600s");
    assert_eq!(tune_bodies[3]["default_lease_ttl"], "3600s");
    assert_eq!(tune_bodies[3]["max_lease_ttl"], "14400s");

    // Neither the name nor the engine settings changed.
    let response = server.get(&format!("/v1/connectionmgmt/connection/aws/{}", id)).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["connection"]["name"], "beta");
    assert_eq!(body["connection"]["testStatus"], "not_tested");
    assert_eq!(body["accessKey"], ROOT_ACCESS_KEY);
    assert_eq!(body["defaultLeaseTtl"], "3600s");
}

#[tokio::test]
async fn link_and_unlink_applications() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let created = create_connection(&server, "prod-billing").await;
    let connection_id = created["connectionId"].as_str().expect("connectionId").to_string();
    let application_id = Uuid::new_v4().to_string();

    let link = format!("/v1/connectionmgmt/connection/{}/link/{}", connection_id, application_id);

    let response = server.post(&link).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["applications"][0], application_id.as_str());

    let response = server.post(&link).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "application_already_linked");

    let unlink =
        format!("/v1/connectionmgmt/connection/{}/unlink/{}", connection_id, application_id);
    let response = server.post(&unlink).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["applications"].as_array().expect("applications").len(), 0);

    let response = server.post(&unlink).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "link_not_found");
}

#[tokio::test]
async fn status_reports_both_backends() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let response = server.get("/v1/connectionmgmt/status").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "UP");
    assert_eq!(body["statusCode"], "datastore_reachable");
    assert_eq!(body["secretsEngine"], "active");
    assert!(!body["timestamp"].as_str().expect("timestamp").is_empty());

    stub.server.reset().await;
    engine_stub::mount_health(&stub.server, 429).await;

    let response = server.get("/v1/connectionmgmt/status").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["secretsEngine"], "standby");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let db = TestDatabase::new().await;
    let stub = EngineStub::start().await;
    let server = api_server(&db, &stub);

    let response = server.get("/api-docs/openapi.json").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["paths"]["/v1/connectionmgmt/connection/aws"].is_object());
    assert!(body["paths"]["/v1/connectionmgmt/status"].is_object());

    let response = server.get("/swagger-ui");
    let status = response.await.status_code();
    assert!(status.is_success() || status.is_redirection());
}
