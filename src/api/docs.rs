use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[allow(unused_imports)]
use crate::api::handlers::{
    AwsConnectionResponse, AwsConnectionsResponse, ConnectionBody, ConnectionPatchBody,
    ConnectionResponse, ConnectionsResponse, CreateAwsConnectionBody, CredentialsResponse,
    DeleteAwsConnectionResponse, StatusResponse, TestAwsConnectionResponse,
    UpdateAwsConnectionBody,
};
#[allow(unused_imports)]
use crate::domain::{ConnectionKind, CredentialType, TestStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::status::status_handler,
        crate::api::handlers::connections::list_connections_handler,
        crate::api::handlers::connections::link_application_handler,
        crate::api::handlers::connections::unlink_application_handler,
        crate::api::handlers::aws_connections::create_aws_connection_handler,
        crate::api::handlers::aws_connections::list_aws_connections_handler,
        crate::api::handlers::aws_connections::get_aws_connection_handler,
        crate::api::handlers::aws_connections::update_aws_connection_handler,
        crate::api::handlers::aws_connections::delete_aws_connection_handler,
        crate::api::handlers::aws_connections::test_aws_connection_handler,
        crate::api::handlers::aws_connections::generate_aws_credentials_handler
    ),
    components(
        schemas(
            StatusResponse,
            ConnectionBody,
            ConnectionPatchBody,
            ConnectionResponse,
            ConnectionsResponse,
            CreateAwsConnectionBody,
            UpdateAwsConnectionBody,
            AwsConnectionResponse,
            AwsConnectionsResponse,
            TestAwsConnectionResponse,
            DeleteAwsConnectionResponse,
            CredentialsResponse,
            ConnectionKind,
            CredentialType,
            TestStatus
        )
    ),
    tags(
        (name = "status", description = "Service and dependency health"),
        (name = "connections", description = "Generic connection listing and application links"),
        (name = "aws-connections", description = "AWS connection lifecycle, connectivity tests, and credential issuance")
    )
)]
pub struct ApiDoc;

pub fn docs_router() -> Router {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()).into()
}
