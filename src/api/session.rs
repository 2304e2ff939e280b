//! HTTP transport session for the Zephyr API.
//!
//! A [`Session`] wraps a `reqwest::Client` configured once at construction
//! with the credential pair, the TLS-verification flag, and a fixed
//! per-request timeout. Every operation in the crate issues exactly one
//! request through it; there are no retries and no rate limiting.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::auth::Auth;
use super::error::{ApiError, Result};
use super::validate;

/// A shared transport session.
///
/// Cheap to clone; the underlying connection pool is shared between clones.
/// The normalized server URL held here is the single source for URL
/// formatting across the crate.
#[derive(Debug, Clone)]
pub struct Session {
    /// The HTTP client with default headers and timeout applied.
    http: Client,
    /// The normalized base URL of the JIRA/Zephyr instance.
    server: String,
    /// Authentication credentials, fixed for the session's lifetime.
    auth: Auth,
    /// The per-request timeout.
    timeout: Duration,
}

impl Session {
    /// Create a new session against a server.
    ///
    /// The credential pair is baked into the default headers, so every
    /// request carries it without per-call plumbing.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(server: &str, auth: Auth, verify_tls: bool, timeout: Duration) -> Result<Self> {
        let server = normalize_base_url(server);

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let mut auth_value = header::HeaderValue::from_str(auth.header_value())
            .map_err(|e| ApiError::ConnectionFailed(format!("invalid credentials: {}", e)))?;
        auth_value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth_value);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            http,
            server,
            auth,
            timeout,
        })
    }

    /// Format a URL under the ZAPI root.
    pub fn zapi_url(&self, path: &str) -> String {
        format!("{}/rest/zapi/latest/{}", self.server, path)
    }

    /// Format a URL under the plain JIRA REST root.
    ///
    /// Used for project discovery, which ZAPI cannot serve.
    pub fn jira_url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.server, path)
    }

    /// Issue a GET and return the status and body without validation.
    pub async fn get_raw(&self, url: &str) -> Result<(StatusCode, String)> {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// Issue a GET, validate the response, and deserialize the body.
    ///
    /// Validation runs in two stages: the status check (with the
    /// 200-with-error-body rewrite) over the raw body, then a check of the
    /// parsed JSON for an embedded error description. The validated body is
    /// always returned to the caller.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let (status, body) = self.get_raw(url).await?;
        validate::check_response(status, &body)?;

        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("failed to parse response: {}", e)))?;
        if let Some(desc) = validate::error_desc(&value) {
            return Err(ApiError::PermissionDenied(desc.to_string()));
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("unexpected response shape: {}", e)))
    }

    /// Issue a PUT with a JSON payload.
    ///
    /// The raw response is handed back unvalidated; the caller is
    /// responsible for checking the status.
    pub async fn put<B>(&self, url: &str, body: &B) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        debug!(%url, "PUT");
        let response = self.http.put(url).json(body).send().await?;
        Ok(response)
    }

    /// Get the normalized server URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Get the username the session authenticates as.
    pub fn username(&self) -> &str {
        self.auth.username()
    }

    /// Get the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Normalize the base URL by removing trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');

    // Warn if not HTTPS (but don't enforce for localhost/testing)
    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1") {
        warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}
