//! Configuration management for the ERP backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ERP__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT session token configuration
    pub jwt: JwtConfig,

    /// Session cookie configuration
    pub session: SessionConfig,

    /// Administrator account created at startup
    #[serde(default)]
    pub admin: AdminConfig,

    /// Admin list display settings
    pub display: DisplayConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing session tokens
    pub secret: String,

    /// Session token expiration in seconds
    pub access_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token
    pub cookie_name: String,

    /// Only send the cookie over HTTPS
    pub secure: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Symbol prefixed to money columns in list views
    pub currency_symbol: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Emit JSON log lines instead of human-readable output
    pub json: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("ERP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 1_209_600)?
            .set_default("session.cookie_name", "erp_session")?
            .set_default("session.secure", false)?
            .set_default("display.currency_symbol", "₹")?
            .set_default("logging.json", false)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ERP__ prefix)
            .add_source(
                Environment::with_prefix("ERP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl AdminConfig {
    /// Username and password when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_credentials_require_both_fields() {
        let both = AdminConfig {
            username: Some("admin".to_string()),
            password: Some("s3cret-pass".to_string()),
        };
        assert_eq!(both.credentials(), Some(("admin", "s3cret-pass")));

        let missing = AdminConfig {
            username: Some("admin".to_string()),
            password: None,
        };
        assert_eq!(missing.credentials(), None);

        let empty = AdminConfig {
            username: Some(String::new()),
            password: Some("x".to_string()),
        };
        assert_eq!(empty.credentials(), None);
    }

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.port, 8000);
        assert_eq!(server.host, "0.0.0.0");
    }
}
