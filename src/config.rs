pub use self::parser::{
    DATABASE_CONNECT_TIMEOUT, DATABASE_MAX_CONNECTIONS, DATABASE_MIN_CONNECTIONS, DATABASE_URL,
    DatabaseConfig, EnvSource, LoggingConfig, ProcessEnv,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
