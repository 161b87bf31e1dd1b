//! Caller-facing error responses.
//!
//! # Responsibilities
//! - Map forwarding failures to HTTP status codes
//! - Render short generic JSON bodies in the backend reply shape
//!   (`{"success": false, "errorMessage": ...}`) so the site forms can show them
//!
//! # Design Decisions
//! - Bodies never carry upstream hostnames, resolver output or error chains
//! - Successful upstream responses never pass through here; they are relayed
//!   untouched by the forwarder

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::forwarder::ForwardError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error_message: &'static str,
}

/// Generic error response for a status.
pub fn error_response(status: StatusCode) -> Response {
    let body = ErrorBody {
        success: false,
        error_message: status.canonical_reason().unwrap_or("Error"),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        error_response(self.kind().status_code())
    }
}
