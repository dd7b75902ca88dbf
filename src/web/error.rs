//! JSON error responses for the API.

use crate::models::QueryError;
use crate::tags::TagError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    NotFound,
    InvalidQuery,
    InvalidPaging,
    InvalidTag,
}

impl ApiErrorCode {
    fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidQuery | Self::InvalidPaging | Self::InvalidTag => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{what} not found"))
    }

    pub fn invalid_paging(name: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidPaging,
            format!("`{name}' must be between 1 and 9999"),
        )
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        Self::new(ApiErrorCode::InvalidQuery, err.to_string())
    }
}

impl From<TagError> for ApiError {
    fn from(err: TagError) -> Self {
        Self::new(ApiErrorCode::InvalidTag, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// `Option` → 404 conversion for handlers.
pub trait OptionNotFoundExt<T> {
    fn or_not_found(self, what: impl std::fmt::Display) -> Result<T, ApiError>;
}

impl<T> OptionNotFoundExt<T> for Option<T> {
    fn or_not_found(self, what: impl std::fmt::Display) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(what))
    }
}
