use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::services::ServiceError;

#[derive(Debug)]
pub struct ServerError {
    status: StatusCode,
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl ServerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let code = status_code_to_string(status);
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, axum::Json(body)).into_response()
    }
}

impl From<ServiceError> for ServerError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidInput(message) => ServerError::new(StatusCode::BAD_REQUEST, message),
            ServiceError::NotFound(_) => ServerError::new(StatusCode::NOT_FOUND, err.to_string()),
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "store request failed");
                ServerError::new(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
            }
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        ServerError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

fn status_code_to_string(status: StatusCode) -> String {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::INTERNAL_SERVER_ERROR => "internal_error",
        StatusCode::SERVICE_UNAVAILABLE => "service_unavailable",
        _ => status.canonical_reason().unwrap_or("error"),
    }
    .to_string()
}
