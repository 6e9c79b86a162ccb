pub use self::engine::QueryEngine;
pub use self::error::DatabaseError;
pub use self::manager::{Connector, LazyDatabase};
pub use self::schema::{ColumnDef, Schema, TableDef};

#[cfg(feature = "postgres")]
pub use self::postgres::{PgConnector, PgDatabase, PgEngine, Pool};

pub mod engine;
pub mod error;
pub mod manager;
pub mod schema;

#[cfg(feature = "postgres")]
pub mod postgres;
