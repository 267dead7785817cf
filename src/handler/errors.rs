//! # Handler Errors
//!
//! Failures surfaced to API clients. Each carries an HTTP status; 4xx
//! errors render with status `fail`, 5xx with status `error`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use super::response::ResponseStatus;
use crate::collection::CollectionError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// No document with this id is visible
    #[error("No document found with id {0}")]
    NotFound(String),

    #[error("Invalid input data. {0}")]
    ValidationFailed(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Duplicate field value for '{field}': {value}. Please use another value")]
    DuplicateKey { field: String, value: String },

    /// Body is not a JSON object
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Can't find {0} on this server")]
    RouteNotFound(String),

    #[error("Method {method} is not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// Body larger than the configured limit, in bytes
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    // ==================
    // Server Errors (5xx)
    // ==================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::MalformedQuery(_) => "MALFORMED_QUERY",
            AppError::DuplicateKey { .. } => "DUPLICATE_KEY",
            AppError::InvalidBody(_) => "INVALID_BODY",
            AppError::RouteNotFound(_) => "ROUTE_NOT_FOUND",
            AppError::MethodNotAllowed { .. } => "METHOD_NOT_ALLOWED",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedQuery(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateKey { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,

            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,

            // 500 Internal Server Error
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status(&self) -> ResponseStatus {
        if self.status_code().is_server_error() {
            ResponseStatus::Error
        } else {
            ResponseStatus::Fail
        }
    }
}

impl From<CollectionError> for AppError {
    fn from(err: CollectionError) -> Self {
        match err {
            CollectionError::Validation(msg) => AppError::ValidationFailed(msg),
            CollectionError::MalformedQuery(msg) => AppError::MalformedQuery(msg),
            CollectionError::DuplicateKey { field, value } => AppError::DuplicateKey { field, value },
            CollectionError::UnknownCollection(name) => {
                AppError::Internal(format!("Unknown collection: {}", name))
            }
            CollectionError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub kind: &'static str,
    pub message: String,
    pub code: u16,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            status: err.status(),
            kind: err.kind(),
            message: err.to_string(),
            code: err.status_code().as_u16(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}
