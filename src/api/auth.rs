//! Authentication handling for the Zephyr API.
//!
//! Zephyr servers accept the same Basic Auth credentials as the JIRA
//! instance they are installed on. The password is encoded into the header
//! value immediately and the raw secret is not kept around.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Authentication credentials for a Zephyr session.
#[derive(Debug, Clone)]
pub struct Auth {
    /// The username half of the credential pair.
    username: String,
    /// The Base64-encoded authorization header value.
    auth_header: String,
}

impl Auth {
    /// Create new authentication credentials from a username and password.
    pub fn new(username: &str, password: &str) -> Self {
        let auth_header = build_auth_header(username, password);
        Self {
            username: username.to_string(),
            auth_header,
        }
    }

    /// Get the authorization header value for HTTP requests.
    ///
    /// Returns the complete "Basic ..." header value.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Build the Basic Auth header value.
///
/// Encodes "username:password" in Base64 and prepends "Basic ".
fn build_auth_header(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_auth_header() {
        let header = build_auth_header("jdoe", "hunter2");
        assert!(header.starts_with("Basic "));

        let encoded = header.strip_prefix("Basic ").unwrap();
        let decoded = BASE64.decode(encoded).unwrap();
        let decoded_str = String::from_utf8(decoded).unwrap();
        assert_eq!(decoded_str, "jdoe:hunter2");
    }

    #[test]
    fn test_auth_new() {
        let auth = Auth::new("jdoe", "secret_password");
        assert_eq!(auth.username(), "jdoe");
        assert!(auth.header_value().starts_with("Basic "));
    }

    #[test]
    fn test_auth_does_not_expose_password() {
        let auth = Auth::new("jdoe", "secret_password");
        let debug_output = format!("{:?}", auth);

        // Password should not appear in debug output
        assert!(!debug_output.contains("secret_password"));
    }
}
