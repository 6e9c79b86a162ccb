use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("table `{0}` is not part of the schema")]
    UnknownTable(String),
}
