//! # Response Envelope
//!
//! Every successful reply is wrapped as
//! `{ "status": "success", "results": n?, "data": { "data": ... } }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Fail,
    Error,
}

/// Payload holder under the envelope's `data` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBody<T> {
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: ResponseStatus,

    /// Number of documents in a list reply
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub results: Option<usize>,

    pub data: Option<DataBody<T>>,
}

/// An envelope together with the status code it is sent with
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub status_code: StatusCode,
    pub envelope: Envelope<T>,
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self::success(StatusCode::OK, Some(data), None)
    }

    pub fn list(data: T, results: usize) -> Self {
        Self::success(StatusCode::OK, Some(data), Some(results))
    }

    pub fn created(data: T) -> Self {
        Self::success(StatusCode::CREATED, Some(data), None)
    }

    pub fn no_content() -> Self {
        Self::success(StatusCode::NO_CONTENT, None, None)
    }

    pub fn data(&self) -> Option<&T> {
        self.envelope.data.as_ref().map(|body| &body.data)
    }

    fn success(status_code: StatusCode, data: Option<T>, results: Option<usize>) -> Self {
        Self {
            status_code,
            envelope: Envelope {
                status: ResponseStatus::Success,
                results,
                data: data.map(|data| DataBody { data }),
            },
        }
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        // 204 carries no body
        if self.status_code == StatusCode::NO_CONTENT {
            return StatusCode::NO_CONTENT.into_response();
        }
        (self.status_code, Json(self.envelope)).into_response()
    }
}
