use async_trait::async_trait;

use super::{DatabaseError, Schema};

/// The operations a query engine exposes.
///
/// [`LazyDatabase`](super::LazyDatabase) implements this trait as well, so
/// callers hold the lazy handle and use it exactly like a live engine.
/// Every member is fallible because reaching the engine may first require
/// connecting.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    fn schema(&self) -> Result<&'static Schema, DatabaseError>;
    async fn ping(&self) -> Result<(), DatabaseError>;
    async fn execute(&self, sql: &str) -> Result<usize, DatabaseError>;
    async fn count_rows(&self, table: &str) -> Result<i64, DatabaseError>;
}
