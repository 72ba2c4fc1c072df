//! PostgreSQL backing for [`PoolManager`].

use crate::pool::{ConnectionConfig, ManagedPool, PoolError, PoolFactory, PoolManager};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection, PgPool,
};
use std::str::FromStr;

/// Pool manager over sqlx PostgreSQL pools
pub type PgPoolManager = PoolManager<PgPoolFactory>;

/// Builds sqlx PostgreSQL pools from a parsed connection string.
///
/// The connection string is parsed once, when the factory is created, so a
/// malformed URL fails startup instead of every reconnect attempt.
#[derive(Debug, Clone)]
pub struct PgPoolFactory {
    options: PgConnectOptions,
}

impl PgPoolFactory {
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, PoolError> {
        let options = PgConnectOptions::from_str(&config.database_url).map_err(|e| {
            PoolError::Configuration(format!("failed to parse database URL: {e}"))
        })?;
        Ok(Self { options })
    }
}

#[async_trait]
impl PoolFactory for PgPoolFactory {
    type Pool = PgPool;

    async fn build(&self, config: &ConnectionConfig) -> Result<PgPool, PoolError> {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .acquire_timeout(config.connect_timeout)
            .connect_with(self.options.clone())
            .await
            .map_err(|e| PoolError::Connect(e.to_string()))
    }
}

#[async_trait]
impl ManagedPool for PgPool {
    async fn ping(&self) -> Result<(), PoolError> {
        let mut conn = self
            .acquire()
            .await
            .map_err(|e| PoolError::Probe(e.to_string()))?;
        conn.ping().await.map_err(|e| PoolError::Probe(e.to_string()))
    }

    async fn close(&self) {
        sqlx::Pool::close(self).await;
    }
}

impl PoolManager<PgPoolFactory> {
    /// Parse the connection string and start a manager over PostgreSQL.
    ///
    /// Fails only on a malformed connection template; an unreachable
    /// database yields a degraded manager that keeps reconnecting.
    pub async fn connect_postgres(config: ConnectionConfig) -> Result<Self, PoolError> {
        let factory = PgPoolFactory::from_config(&config)?;
        Self::start(factory, config).await
    }
}
