//! API error types for the Zephyr client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when interacting with the Zephyr API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failed - invalid username or password.
    #[error("Authentication failed: check your username and password")]
    Unauthorized,

    /// Permission denied - user lacks access to the resource.
    #[error("Permission denied: you don't have access to this resource")]
    Forbidden,

    /// The server accepted the request but reported a permission failure
    /// inside an otherwise successful response body.
    #[error("Permission denied by the server: {0}")]
    PermissionDenied(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A name lookup matched more than one resource.
    #[error("Ambiguous name: {0}")]
    Ambiguous(String),

    /// Rate limited by the server.
    #[error("Rate limited: please wait before retrying")]
    RateLimited,

    /// Zephyr server error.
    #[error("Zephyr server error: {0}")]
    ServerError(String),

    /// Network or HTTP error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid response from the API.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Connection validation failed.
    #[error("Connection validation failed: {0}")]
    ConnectionFailed(String),

    /// Failed to move executions between folders. Carries the raw response
    /// so callers can inspect what the server actually said.
    #[error("Failed to move executions: HTTP {status}: {body}")]
    MoveFailed {
        /// The HTTP status of the rejected move request.
        status: StatusCode,
        /// The raw response body.
        body: String,
    },
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from an HTTP status code.
    pub fn from_status(status: StatusCode, context: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(context.to_string()),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(format!("HTTP {}: {}", status, context)),
            _ => ApiError::ServerError(format!("Unexpected HTTP {}: {}", status, context)),
        }
    }
}
