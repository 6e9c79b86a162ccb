//! A PostgreSQL handle that connects on first use.
//!
//! Hosts declare one process-wide handle and use it as if it were the live
//! query engine. Nothing is read from the environment and no connection is
//! opened until the first operation runs, so the handle can be declared in
//! code that is compiled or imported without any database configuration.
//!
//! ```ignore
//! use lazy_pg::{PgDatabase, QueryEngine, Schema, TableDef};
//! use once_cell::sync::Lazy;
//!
//! static SCHEMA: Schema = Schema::new(&[TableDef { name: "users", columns: &[] }]);
//! static DB: Lazy<PgDatabase> = Lazy::new(|| PgDatabase::from_env(&SCHEMA));
//!
//! async fn user_count() -> Result<i64, lazy_pg::DatabaseError> {
//!     DB.count_rows("users").await
//! }
//! ```
#![forbid(unsafe_code)]

pub mod config;
pub mod db;
pub mod utils;

pub use config::{ConfigError, DatabaseConfig, EnvSource, LoggingConfig, ProcessEnv};
pub use db::{ColumnDef, Connector, DatabaseError, LazyDatabase, QueryEngine, Schema, TableDef};

#[cfg(feature = "postgres")]
pub use db::{PgConnector, PgDatabase, PgEngine, Pool};
