use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::errors::Error;

/// Error returned from API handlers.
///
/// Carries the HTTP status plus the stable machine code written into the
/// response envelope. Domain errors convert via `From<Error>`, which keeps
/// the code in lockstep with the error taxonomy.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self { status: StatusCode::BAD_REQUEST, code: "bad_request", message: message.into() }
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self { status: StatusCode::NOT_FOUND, code: "not_found", message: message.into() }
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self { status: StatusCode::CONFLICT, code: "conflict", message: message.into() }
    }

    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "service_unavailable",
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(ErrorBody { error: self.code, message: self.message })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if let Error::Database { source, context } = &err {
            if let Some(db_err) = source.as_database_error() {
                if let Some(code) = db_err.code() {
                    if code.as_ref() == "2067" || code.as_ref().starts_with("SQLITE_CONSTRAINT") {
                        return ApiError {
                            status: StatusCode::CONFLICT,
                            code: "conflict",
                            message: context.clone(),
                        };
                    }
                }
            }
        }

        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        ApiError { status, code: err.code(), message: err.to_string() }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::from(Error::from(errors))
    }
}
