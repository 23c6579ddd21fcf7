//! API request handlers

pub mod campaigns;
pub mod credits;
pub mod health;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error response body
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
        }
    }
}

/// Shorthand for the error half of a handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn forbidden() -> ApiError {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorResponse::new(
            "forbidden",
            "Not authorized for this tenant",
        )),
    )
}
