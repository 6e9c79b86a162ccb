use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use url::Url;

use super::ConfigError;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const DATABASE_MIN_CONNECTIONS: &str = "DATABASE_MIN_CONNECTIONS";
pub const DATABASE_CONNECT_TIMEOUT: &str = "DATABASE_CONNECT_TIMEOUT";

/// Where configuration values come from.
///
/// The process environment is the real source; tests hand in a map so they
/// never touch global state.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    // Earlier files win: dotenvy never overrides a variable that is already set.
    let loaded = [
        (".env.local", dotenvy::from_filename(".env.local")),
        (".env", dotenvy::dotenv()),
    ];
    for (name, result) in loaded {
        if let Err(e) = tolerate_missing(result) {
            warn!("failed to load {}: {}", name, e);
        }
    }
});

/// A missing dotenv file is fine; an unreadable or malformed one is not.
fn tolerate_missing(result: Result<PathBuf, dotenvy::Error>) -> Result<(), dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Err(e),
        _ => Ok(()),
    }
}

/// Reads `std::env`, after loading `.env.local` and `.env` once per process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        Lazy::force(&DOTENV_LOADED);
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

#[derive(Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub url: Option<SecretString>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
    #[serde(default)]
    pub connection_timeout_secs: Option<u64>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connection_timeout_secs", &self.connection_timeout_secs)
            .finish()
    }
}

impl DatabaseConfig {
    /// Builds the config from `DATABASE_*` variables and validates it.
    pub fn from_env(source: &dyn EnvSource) -> Result<Self, ConfigError> {
        let config = Self {
            url: source.var(DATABASE_URL).map(SecretString::from),
            max_connections: parse_var(source, DATABASE_MAX_CONNECTIONS)?,
            min_connections: parse_var(source, DATABASE_MIN_CONNECTIONS)?,
            connection_timeout_secs: parse_var(source, DATABASE_CONNECT_TIMEOUT)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn connection_string(&self) -> &str {
        self.url
            .as_ref()
            .map(|url| url.expose_secret().trim())
            .unwrap_or_default()
    }

    /// The connection string with any password masked, for logs.
    pub fn redacted_url(&self) -> String {
        redact(self.connection_string())
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(10)
    }

    pub fn min_connections(&self) -> u32 {
        self.min_connections.unwrap_or(1)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs.unwrap_or(30))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    source: &dyn EnvSource,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match source.var(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidConfig(format!("{key} must be a number, got {raw:?}"))),
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn redact(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) if raw.is_empty() => String::new(),
        Err(_) => "<unparseable>".to_string(),
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
