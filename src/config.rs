//! Configuration for the Zephyr client.
//!
//! Connection settings live in a TOML file, with `ZEPHYR_*` environment
//! variables taking precedence over file values. The configuration is read
//! once at client construction and never consulted again.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default request timeout in seconds when the file does not set one.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("Could not determine the configuration directory")]
    NoConfigDir,

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML.
    #[error("Invalid configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Connection settings for a Zephyr server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// The base URL of the JIRA instance the Zephyr plugin runs on.
    pub server: String,

    /// The username half of the Basic Auth credential pair.
    pub username: String,

    /// The password half of the credential pair.
    pub password: String,

    /// Whether to verify the server's TLS certificate.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from the default location, with environment
    /// overrides applied on top.
    pub fn load_default() -> Result<Self> {
        let mut config = Self::load(Self::default_path()?)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// The default configuration file path.
    ///
    /// Resolves to `{config_dir}/zephyr/config.toml`, e.g.
    /// `~/.config/zephyr/config.toml` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        let base_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base_dir.join("zephyr").join("config.toml"))
    }

    /// Apply `ZEPHYR_*` environment variable overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(server) = env::var("ZEPHYR_SERVER") {
            self.server = server;
        }
        if let Ok(username) = env::var("ZEPHYR_USERNAME") {
            self.username = username;
        }
        if let Ok(password) = env::var("ZEPHYR_PASSWORD") {
            self.password = password;
        }
        if let Ok(verify) = env::var("ZEPHYR_VERIFY_TLS") {
            self.verify_tls = parse_bool("ZEPHYR_VERIFY_TLS", &verify)?;
        }
        if let Ok(timeout) = env::var("ZEPHYR_TIMEOUT_SECS") {
            self.timeout_secs = timeout.parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "ZEPHYR_TIMEOUT_SECS is not an integer: {:?}",
                    timeout
                ))
            })?;
        }
        Ok(())
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::Validation` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() {
            return Err(ConfigError::Validation(
                "server URL cannot be empty".to_string(),
            ));
        }

        if !self.server.starts_with("https://") && !self.server.starts_with("http://") {
            return Err(ConfigError::Validation(format!(
                "server URL '{}' must start with http:// or https://",
                self.server
            )));
        }

        if self.username.is_empty() {
            return Err(ConfigError::Validation(
                "username cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The per-request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Validation(format!(
            "{} is not a boolean: {:?}",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serial_test::serial;
    use tempfile::NamedTempFile;

    use super::*;

    fn sample_config() -> Config {
        Config {
            server: "https://jira.example.com".to_string(),
            username: "jdoe".to_string(),
            password: "hunter2".to_string(),
            verify_tls: true,
            timeout_secs: 10,
        }
    }

    fn clear_env() {
        for name in [
            "ZEPHYR_SERVER",
            "ZEPHYR_USERNAME",
            "ZEPHYR_PASSWORD",
            "ZEPHYR_VERIFY_TLS",
            "ZEPHYR_TIMEOUT_SECS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server = "https://jira.example.com"
username = "jdoe"
password = "hunter2"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server, "https://jira.example.com");
        assert_eq!(config.username, "jdoe");
        assert!(config.verify_tls);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server = ").unwrap();

        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("/nonexistent/zephyr/config.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config = sample_config();
        config.server = "jira.example.com".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must start with http"));
    }

    #[test]
    fn test_validate_rejects_empty_username() {
        let mut config = sample_config();
        config.username = String::new();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("ZEPHYR_SERVER", "https://other.example.com");
        env::set_var("ZEPHYR_VERIFY_TLS", "false");
        env::set_var("ZEPHYR_TIMEOUT_SECS", "42");

        let mut config = sample_config();
        config.apply_env().unwrap();

        assert_eq!(config.server, "https://other.example.com");
        assert!(!config.verify_tls);
        assert_eq!(config.timeout_secs, 42);
        assert_eq!(config.username, "jdoe");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_rejects_bad_values() {
        clear_env();
        env::set_var("ZEPHYR_TIMEOUT_SECS", "soon");

        let mut config = sample_config();
        assert!(matches!(
            config.apply_env(),
            Err(ConfigError::Validation(_))
        ));

        clear_env();
    }

    #[test]
    fn test_config_round_trip() {
        let config = sample_config();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_timeout_duration() {
        let config = sample_config();
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }
}
