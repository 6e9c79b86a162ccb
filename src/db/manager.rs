//! Lazily connecting database handle.
//!
//! [`LazyDatabase`] owns no connection when it is created. The first
//! operation run through it reads the configuration, connects the client,
//! wraps it in a query engine and caches both; every later operation reuses
//! them. Creation of the client and of the engine each happens at most once
//! per handle, even under concurrent first access.
//!
//! A failed construction caches nothing, so the next access tries again. When
//! the client connected but wrapping it failed, the client is kept and only
//! the engine is rebuilt on the next access.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{DatabaseConfig, EnvSource};
use crate::db::{DatabaseError, QueryEngine, Schema};

/// Builds the client and the query engine on behalf of [`LazyDatabase`].
pub trait Connector: Send + Sync + 'static {
    type Client: Send + Sync + 'static;
    type Engine: QueryEngine + 'static;

    fn connect(&self, config: &DatabaseConfig) -> Result<Self::Client, DatabaseError>;

    fn wrap(
        &self,
        client: Arc<Self::Client>,
        schema: &'static Schema,
    ) -> Result<Self::Engine, DatabaseError>;
}

pub struct LazyDatabase<C: Connector> {
    connector: C,
    schema: &'static Schema,
    source: Box<dyn EnvSource>,
    config: OnceCell<DatabaseConfig>,
    client: OnceCell<Arc<C::Client>>,
    engine: OnceCell<Arc<C::Engine>>,
}

impl<C: Connector> LazyDatabase<C> {
    /// Creates the handle. No configuration is read and nothing connects.
    pub fn new(connector: C, schema: &'static Schema, source: impl EnvSource + 'static) -> Self {
        Self {
            connector,
            schema,
            source: Box::new(source),
            config: OnceCell::new(),
            client: OnceCell::new(),
            engine: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    /// Returns the query engine, connecting first if needed.
    pub fn engine(&self) -> Result<Arc<C::Engine>, DatabaseError> {
        if let Some(engine) = self.engine.get() {
            return Ok(engine.clone());
        }

        self.engine
            .get_or_try_init(|| -> Result<_, DatabaseError> {
                let client = self.connect_client()?;
                let engine = self
                    .connector
                    .wrap(client, self.schema)
                    .inspect_err(|e| warn!("failed to build query engine: {}", e))?;
                info!("query engine ready");
                Ok(Arc::new(engine))
            })
            .cloned()
    }

    /// Returns the shared client, connecting first if needed.
    pub fn client(&self) -> Result<Arc<C::Client>, DatabaseError> {
        self.engine()?;
        self.connect_client()
    }

    fn connect_client(&self) -> Result<Arc<C::Client>, DatabaseError> {
        self.client
            .get_or_try_init(|| -> Result<_, DatabaseError> {
                let config = self
                    .config
                    .get_or_try_init(|| DatabaseConfig::from_env(self.source.as_ref()))?;

                info!("connecting to database at {}", config.redacted_url());
                let client = self
                    .connector
                    .connect(config)
                    .inspect_err(|e| warn!("database connection failed: {}", e))?;
                Ok(Arc::new(client))
            })
            .cloned()
    }

    fn access(&self, operation: &'static str) -> Result<Arc<C::Engine>, DatabaseError> {
        debug!(
            "forwarding {} to query engine initialized={}",
            operation,
            self.is_initialized()
        );
        self.engine()
    }
}

#[async_trait]
impl<C: Connector> QueryEngine for LazyDatabase<C> {
    fn schema(&self) -> Result<&'static Schema, DatabaseError> {
        self.access("schema")?.schema()
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.access("ping")?.ping().await
    }

    async fn execute(&self, sql: &str) -> Result<usize, DatabaseError> {
        self.access("execute")?.execute(sql).await
    }

    async fn count_rows(&self, table: &str) -> Result<i64, DatabaseError> {
        self.access("count_rows")?.count_rows(table).await
    }
}
