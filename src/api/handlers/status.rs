//! Service status endpoint.
//!
//! Reports liveness of the two backends this service depends on. The
//! endpoint always answers 200; degradation is carried in the body so
//! monitors can distinguish "service down" from "dependency down".

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::api::routes::ApiState;
use crate::vault::EngineHealth;

/// Status code reported when the datastore answers the ping.
pub const STATUS_CODE_UP: &str = "datastore_reachable";
/// Status code reported when the datastore ping fails.
pub const STATUS_CODE_DOWN: &str = "datastore_unreachable";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "status": "UP",
    "statusCode": "datastore_reachable",
    "timestamp": "2026-01-15T10:30:00+00:00",
    "secretsEngine": "active"
}))]
pub struct StatusResponse {
    /// `UP` when the datastore is reachable, `DOWN` otherwise.
    pub status: String,
    /// Stable machine code for the datastore state.
    pub status_code: String,
    /// Time the check ran, RFC 3339.
    pub timestamp: String,
    /// Secrets engine health: `active`, `standby`, or `unreachable`.
    pub secrets_engine: String,
}

#[utoipa::path(
    get,
    path = "/v1/connectionmgmt/status",
    responses(
        (status = 200, description = "Service status", body = StatusResponse),
    ),
    tag = "status"
)]
pub async fn status_handler(State(state): State<ApiState>) -> Json<StatusResponse> {
    let service = &state.connection_service;

    let (status, status_code) = match service.ping_datastore().await {
        Ok(()) => ("UP", STATUS_CODE_UP),
        Err(err) => {
            error!(error = %err, "Datastore ping failed during status check");
            ("DOWN", STATUS_CODE_DOWN)
        }
    };

    let secrets_engine = match service.engine_health().await {
        Ok(EngineHealth::Active) => "active",
        Ok(EngineHealth::Standby) => "standby",
        Err(err) => {
            error!(error = %err, "Secrets engine health check failed during status check");
            "unreachable"
        }
    };

    Json(StatusResponse {
        status: status.to_string(),
        status_code: status_code.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        secrets_engine: secrets_engine.to_string(),
    })
}
