use thiserror::Error;
use url::Url;

use super::DatabaseConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "DATABASE_URL is not set. \
         For local development: create a .env.local file with DATABASE_URL. \
         For Vercel deployments: set DATABASE_URL in your project's environment variables."
    )]
    MissingDatabaseUrl,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let raw = self.connection_string();
        if raw.is_empty() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        let url = Url::parse(raw).map_err(|e| {
            ConfigError::InvalidConfig(format!("DATABASE_URL is not a valid URL: {e}"))
        })?;
        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(ConfigError::InvalidConfig(format!(
                "DATABASE_URL must use the postgres:// or postgresql:// scheme, got {}://",
                url.scheme()
            )));
        }

        if self.max_connections() == 0 {
            return Err(ConfigError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.connection_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "connection_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.min_connections() > self.max_connections() {
            return Err(ConfigError::InvalidConfig(format!(
                "min_connections ({}) cannot exceed max_connections ({})",
                self.min_connections(),
                self.max_connections()
            )));
        }

        Ok(())
    }
}
