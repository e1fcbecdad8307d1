//! Configuration management

use crate::error::{DarajaError, DarajaResult, ErrorContext};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarajaConfig {
    pub api: ApiConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}

/// Backend authentication API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    pub login_path: String,
    pub logout_path: String,
    pub session_path: String,
    /// Upper bound for the best-effort revoke call made on logout
    pub logout_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".to_string(),
            timeout_seconds: 30,
            user_agent: format!("daraja/{}", env!("CARGO_PKG_VERSION")),
            login_path: "/auth/login".to_string(),
            logout_path: "/auth/logout".to_string(),
            session_path: "/auth/me".to_string(),
            logout_timeout_ms: 3000,
        }
    }
}

impl ApiConfig {
    /// Join a path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Session lifecycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Storage key holding the persisted session record
    pub storage_key: String,
    /// Seconds between expiry monitor ticks
    pub expiry_check_interval_secs: u64,
    /// Horizon before expiry at which a warning is emitted
    pub expiry_warning_secs: u64,
    /// Re-validate a restored session against the backend
    pub validate_on_restore: bool,
    /// Read back every write to persistent storage
    pub verify_writes: bool,
    /// Route the navigator is sent to on logout
    pub login_route: String,
    /// Routes that never trigger a logout redirect
    pub public_routes: Vec<String>,
    /// Directory used by the file-backed store
    pub data_dir: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_key: "daraja.session".to_string(),
            expiry_check_interval_secs: 60,
            expiry_warning_secs: 300,
            validate_on_restore: true,
            verify_writes: true,
            login_route: "/login".to_string(),
            public_routes: vec![
                "/login".to_string(),
                "/register".to_string(),
                "/forgot-password".to_string(),
            ],
            data_dir: None,
        }
    }
}

impl SessionSettings {
    /// Whether a route is reachable without a session
    pub fn is_public_route(&self, route: &str) -> bool {
        let route = route.split(['?', '#']).next().unwrap_or(route);
        self.public_routes.iter().any(|public| public == route)
    }

    /// Data directory for the file-backed store, falling back to the platform data dir
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("daraja")))
    }
}

fn config_failure(
    message: String,
    operation: &str,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    suggestion: &str,
) -> DarajaError {
    DarajaError::Config {
        message,
        source,
        context: ErrorContext::new("config")
            .with_operation(operation)
            .with_suggestion(suggestion),
    }
}

impl DarajaConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DarajaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            config_failure(
                format!("Failed to read config file: {}", e),
                "read_file",
                Some(Box::new(e)),
                "Check if the config file exists and is readable",
            )
        })?;

        let config: DarajaConfig = toml::from_str(&content).map_err(|e| {
            config_failure(
                format!("Failed to parse config: {}", e),
                "parse_toml",
                Some(Box::new(e)),
                "Check TOML syntax in config file",
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DarajaResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            config_failure(
                format!("Failed to serialize config: {}", e),
                "serialize_toml",
                Some(Box::new(e)),
                "Report this as a bug",
            )
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| {
            config_failure(
                format!("Failed to write config file: {}", e),
                "write_file",
                Some(Box::new(e)),
                "Check if the directory exists and is writable",
            )
        })?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> DarajaResult<()> {
        url::Url::parse(&self.api.base_url).map_err(|e| {
            config_failure(
                format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
                "validate",
                Some(Box::new(e)),
                "Set api.base_url to an absolute http(s) URL",
            )
        })?;

        if self.api.timeout_seconds == 0 {
            return Err(config_failure(
                "api.timeout_seconds must be greater than 0".to_string(),
                "validate",
                None,
                "Set api.timeout_seconds to a positive value",
            ));
        }

        if self.session.storage_key.trim().is_empty() {
            return Err(config_failure(
                "session.storage_key must not be empty".to_string(),
                "validate",
                None,
                "Set session.storage_key, e.g. \"daraja.session\"",
            ));
        }

        if self.session.expiry_check_interval_secs == 0 {
            return Err(config_failure(
                "session.expiry_check_interval_secs must be greater than 0".to_string(),
                "validate",
                None,
                "Set session.expiry_check_interval_secs to a positive value",
            ));
        }

        if self.session.expiry_warning_secs < self.session.expiry_check_interval_secs {
            return Err(config_failure(
                "session.expiry_warning_secs must not be shorter than the check interval"
                    .to_string(),
                "validate",
                None,
                "Raise session.expiry_warning_secs or lower the check interval",
            ));
        }

        if !self.session.is_public_route(&self.session.login_route) {
            return Err(config_failure(
                format!(
                    "session.login_route '{}' must be listed in session.public_routes",
                    self.session.login_route
                ),
                "validate",
                None,
                "Add the login route to session.public_routes",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DarajaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.expiry_check_interval_secs, 60);
        assert_eq!(config.session.expiry_warning_secs, 300);
    }

    #[test]
    fn test_endpoint_join() {
        let api = ApiConfig {
            base_url: "https://api.daraja.test/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(api.endpoint("/auth/login"), "https://api.daraja.test/v1/auth/login");
        assert_eq!(api.endpoint("auth/me"), "https://api.daraja.test/v1/auth/me");
    }

    #[test]
    fn test_public_route_ignores_query() {
        let settings = SessionSettings::default();
        assert!(settings.is_public_route("/login?next=/dashboard"));
        assert!(!settings.is_public_route("/dashboard"));
    }

    #[test]
    fn test_login_route_must_be_public() {
        let mut config = DarajaConfig::default();
        config.session.login_route = "/sign-in".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, DarajaError::Config { .. }));
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = DarajaConfig::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
