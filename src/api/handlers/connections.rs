use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::api::handlers::aws_connections::{parse_id, ConnectionResponse};
use crate::api::handlers::pagination::ListQuery;
use crate::api::routes::ApiState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionsResponse {
    pub skip: i64,
    pub limit: i64,
    pub total: i64,
    pub items: Vec<ConnectionResponse>,
}

#[utoipa::path(
    get,
    path = "/v1/connectionmgmt/connections",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of connections", body = ConnectionsResponse),
        (status = 400, description = "Invalid pagination parameters")
    ),
    tag = "connections"
)]
pub async fn list_connections_handler(
    State(state): State<ApiState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ConnectionsResponse>, ApiError> {
    let service = &state.connection_service;
    let (limit, skip) = service.resolve_page(params.limit, params.skip).map_err(ApiError::from)?;
    let page = service.list_connections(limit, skip).await.map_err(ApiError::from)?;

    Ok(Json(ConnectionsResponse {
        skip: page.skip,
        limit: page.limit,
        total: page.total,
        items: page.items.into_iter().map(ConnectionResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/connectionmgmt/connection/{id}/link/{application_id}",
    params(
        ("id" = String, Path, description = "Connection ID (UUID)"),
        ("application_id" = String, Path, description = "Application ID (UUID)")
    ),
    responses(
        (status = 200, description = "Application linked", body = ConnectionResponse),
        (status = 400, description = "Malformed ID or application already linked"),
        (status = 404, description = "Connection not found")
    ),
    tag = "connections"
)]
#[instrument(skip(state), fields(id = %id, application_id = %application_id))]
pub async fn link_application_handler(
    State(state): State<ApiState>,
    Path((id, application_id)): Path<(String, String)>,
) -> Result<Json<ConnectionResponse>, ApiError> {
    let id = parse_id(&id)?;
    let application_id = parse_id(&application_id)?;

    let connection = state
        .connection_service
        .link_application(&id, &application_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ConnectionResponse::from(connection)))
}

#[utoipa::path(
    post,
    path = "/v1/connectionmgmt/connection/{id}/unlink/{application_id}",
    params(
        ("id" = String, Path, description = "Connection ID (UUID)"),
        ("application_id" = String, Path, description = "Application ID (UUID)")
    ),
    responses(
        (status = 200, description = "Application unlinked", body = ConnectionResponse),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Connection or link not found")
    ),
    tag = "connections"
)]
#[instrument(skip(state), fields(id = %id, application_id = %application_id))]
pub async fn unlink_application_handler(
    State(state): State<ApiState>,
    Path((id, application_id)): Path<(String, String)>,
) -> Result<Json<ConnectionResponse>, ApiError> {
    let id = parse_id(&id)?;
    let application_id = parse_id(&application_id)?;

    let connection = state
        .connection_service
        .unlink_application(&id, &application_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ConnectionResponse::from(connection)))
}
