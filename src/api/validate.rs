//! Response validation for the Zephyr API.
//!
//! Zephyr signals failures through two different conventions: regular 4xx/5xx
//! status codes, and a 200 response whose body carries an error payload such
//! as `{"errorDesc": "...", "errorId": "ERROR"}`. The latter shows up when a
//! request is made without credentials, where a plain 401 would be expected.
//! The functions here fold both conventions into the one [`ApiError`]
//! contract. They operate on `(status, body)` pairs only, with no knowledge
//! of the HTTP client that produced them.

use reqwest::StatusCode;
use serde_json::Value;

use super::error::{ApiError, Result};

/// The field Zephyr uses to describe an error inside a response body.
pub const ERROR_DESC: &str = "errorDesc";

/// Rewrite a disguised permission failure into a recognizable one.
///
/// A 200 response whose raw body mentions the error marker is treated as a
/// 401 before any status check happens.
pub fn effective_status(status: StatusCode, body: &str) -> StatusCode {
    if status == StatusCode::OK && body.contains(ERROR_DESC) {
        StatusCode::UNAUTHORIZED
    } else {
        status
    }
}

/// Check a completed response for failure.
///
/// Applies the status rewrite, then maps any non-success status to the
/// matching [`ApiError`] with the response body as context.
pub fn check_response(status: StatusCode, body: &str) -> Result<()> {
    let status = effective_status(status, body);
    if !status.is_success() {
        return Err(ApiError::from_status(status, body));
    }
    Ok(())
}

/// Extract the error description from a parsed response body, if present.
///
/// Checked after a GET succeeds structurally; a populated `errorDesc` field
/// means the server rejected the request despite the success status.
pub fn error_desc(body: &Value) -> Option<&str> {
    body.get(ERROR_DESC).and_then(Value::as_str)
}
