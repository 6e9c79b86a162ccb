use std::sync::Arc;

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::BigInt;

use crate::config::{DatabaseConfig, ProcessEnv};

use super::{Connector, DatabaseError, LazyDatabase, QueryEngine, Schema};

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// The lazy handle over a diesel Postgres pool.
pub type PgDatabase = LazyDatabase<PgConnector>;

impl PgDatabase {
    /// Handle that reads `DATABASE_URL` from the process environment on first use.
    ///
    /// ```ignore
    /// static DB: Lazy<PgDatabase> = Lazy::new(|| PgDatabase::from_env(&SCHEMA));
    /// ```
    pub fn from_env(schema: &'static Schema) -> Self {
        Self::new(PgConnector, schema, ProcessEnv)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

impl Connector for PgConnector {
    type Client = Pool;
    type Engine = PgEngine;

    fn connect(&self, config: &DatabaseConfig) -> Result<Pool, DatabaseError> {
        let manager = ConnectionManager::<PgConnection>::new(config.connection_string());

        r2d2::Pool::builder()
            .max_size(config.max_connections())
            .min_idle(Some(config.min_connections()))
            .connection_timeout(config.connection_timeout())
            .build(manager)
            .map_err(|e| DatabaseError::Connection(e.to_string()))
    }

    fn wrap(&self, client: Arc<Pool>, schema: &'static Schema) -> Result<PgEngine, DatabaseError> {
        Ok(PgEngine {
            pool: client,
            schema,
        })
    }
}

pub struct PgEngine {
    pool: Arc<Pool>,
    schema: &'static Schema,
}

impl PgEngine {
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

#[derive(QueryableByName)]
struct RowCount {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

async fn with_connection<T, F>(pool: Arc<Pool>, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

#[async_trait]
impl QueryEngine for PgEngine {
    fn schema(&self) -> Result<&'static Schema, DatabaseError> {
        Ok(self.schema)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        with_connection(self.pool.clone(), |conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn execute(&self, sql: &str) -> Result<usize, DatabaseError> {
        let sql = sql.to_string();
        with_connection(self.pool.clone(), move |conn| {
            diesel::sql_query(sql)
                .execute(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn count_rows(&self, table: &str) -> Result<i64, DatabaseError> {
        let table = self.schema.require_table(table)?;
        let sql = format!("SELECT COUNT(*) AS count FROM {}", table.quoted_name());
        with_connection(self.pool.clone(), move |conn| {
            diesel::sql_query(sql)
                .get_result::<RowCount>(conn)
                .map(|row| row.count)
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;
    use crate::config::ConfigError;
    use crate::db::{ColumnDef, TableDef};

    static SCHEMA: Schema = Schema::new(&[TableDef {
        name: "users",
        columns: &[ColumnDef {
            name: "id",
            sql_type: "bigint",
            nullable: false,
        }],
    }]);

    fn idle_engine() -> PgEngine {
        let manager = ConnectionManager::<PgConnection>::new("postgres://u:p@127.0.0.1:1/db");
        let pool = r2d2::Pool::builder()
            .min_idle(Some(0))
            .connection_timeout(Duration::from_millis(200))
            .build_unchecked(manager);
        PgConnector
            .wrap(Arc::new(pool), &SCHEMA)
            .expect("wrap never fails")
    }

    #[tokio::test]
    async fn count_rows_rejects_tables_outside_the_schema() {
        let engine = idle_engine();
        assert_eq!(
            engine.count_rows("posts").await,
            Err(DatabaseError::UnknownTable("posts".to_string()))
        );
    }

    #[tokio::test]
    async fn unreachable_database_surfaces_connection_error() {
        let engine = idle_engine();
        assert!(matches!(
            engine.ping().await,
            Err(DatabaseError::Connection(_))
        ));
    }

    #[test]
    fn connect_fails_when_pool_cannot_fill() {
        let config = DatabaseConfig {
            url: Some(SecretString::from("postgres://u:p@127.0.0.1:1/db".to_string())),
            connection_timeout_secs: Some(1),
            ..Default::default()
        };

        assert!(matches!(
            PgConnector.connect(&config),
            Err(DatabaseError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn handle_without_url_reports_configuration_error() {
        let db = PgDatabase::new(PgConnector, &SCHEMA, HashMap::<String, String>::new());

        assert_eq!(
            db.ping().await,
            Err(DatabaseError::Configuration(ConfigError::MissingDatabaseUrl))
        );
        assert!(!db.is_initialized());
    }

    #[tokio::test]
    async fn zero_connect_timeout_is_a_configuration_error() {
        let env: HashMap<String, String> = [
            ("DATABASE_URL", "postgres://u:p@127.0.0.1:1/db"),
            ("DATABASE_CONNECT_TIMEOUT", "0"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let db = PgDatabase::new(PgConnector, &SCHEMA, env);

        assert!(matches!(
            db.ping().await,
            Err(DatabaseError::Configuration(ConfigError::InvalidConfig(_)))
        ));
        assert!(!db.is_initialized());
    }

    #[test]
    fn engine_exposes_its_schema() {
        let engine = idle_engine();
        assert!(std::ptr::eq(engine.schema().expect("schema"), &SCHEMA));
    }
}
