//! Response shaping and error-to-status mapping.
//!
//! # Design Decisions
//! - Errors are rendered as `{"error": "<message>"}`
//! - Validation and malformed bodies are 400, missing entries 404
//! - Body rejections keep axum's status (413 too large, 415 wrong content type)
//! - Storage failures are 500 with a generic message; the cause is logged

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::ServiceError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::new(StatusCode::BAD_REQUEST, message),
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Server config not found"),
            ServiceError::Internal(source) => {
                tracing::error!(error = %source, "Request failed on storage");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ConfigEntryId, RepositoryError};

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound(ConfigEntryId::new()), StatusCode::NOT_FOUND),
            (
                ServiceError::Internal(RepositoryError::Closed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
