//! Request and error types of the HTTP API

use crate::api::Platform;
use crate::error::Error;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/search`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub platform: String,
    pub username: String,
}

impl SearchRequest {
    pub fn platform(&self) -> Result<Platform, ApiError> {
        self.platform
            .parse()
            .map_err(|e: String| ApiError::bad_request(e))
    }
}

/// Body of tracker mutations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub hash: crate::triumphs::Hash,
    pub tracked: bool,
    pub changed: bool,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

/// Error half of every handler result
pub type ApiFailure = (StatusCode, Json<ApiError>);

impl ApiError {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn no_tree() -> Self {
        Self::new("NO_TREE", "No triumph tree yet; search for a player first")
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new("UPSTREAM_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// HTTP status matching the error code
    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "NO_TREE" => StatusCode::CONFLICT,
            "UPSTREAM_ERROR" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_failure(self) -> ApiFailure {
        (self.status(), Json(self))
    }
}

impl From<ApiError> for ApiFailure {
    fn from(e: ApiError) -> Self {
        e.into_failure()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match &e {
            Error::PlayerNotFound(_) => Self::not_found(e.to_string()),
            Error::NoActiveQuery => Self::no_tree(),
            Error::Api { .. } | Error::Http(_) | Error::Manifest(_) | Error::Serialization(_) => {
                Self::upstream(e.to_string())
            }
            Error::Config(_) | Error::Tracker(_) | Error::Io(_) => Self::internal(e.to_string()),
        }
    }
}
