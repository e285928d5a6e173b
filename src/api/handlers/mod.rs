//! HTTP request handlers organized by resource type

pub mod aws_connections;
pub mod connections;
pub mod pagination;
pub mod status;

pub use aws_connections::{
    create_aws_connection_handler, delete_aws_connection_handler,
    generate_aws_credentials_handler, get_aws_connection_handler, list_aws_connections_handler,
    test_aws_connection_handler, update_aws_connection_handler,
};
pub use connections::{
    link_application_handler, list_connections_handler, unlink_application_handler,
};
pub use status::status_handler;

// Re-export DTOs for OpenAPI docs
pub use aws_connections::{
    AwsConnectionResponse, AwsConnectionsResponse, ConnectionBody, ConnectionPatchBody,
    ConnectionResponse, CreateAwsConnectionBody, CredentialsResponse,
    DeleteAwsConnectionResponse, TestAwsConnectionResponse, UpdateAwsConnectionBody,
};
pub use connections::ConnectionsResponse;
pub use pagination::ListQuery;
pub use status::StatusResponse;
