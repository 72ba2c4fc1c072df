//! Resilient connection-pool manager.
//!
//! [`PoolManager`] owns at most one live pool handle and keeps it alive:
//! a background task probes the pool on a fixed interval and runs a bounded
//! reconnect cycle whenever the pool is absent or stops answering. Request
//! handlers only ever call [`PoolManager::get_handle`], which takes the shared
//! lock for the duration of an `Arc` clone and never waits on network I/O.
//!
//! The manager is generic over a [`PoolFactory`] so the lifecycle can be
//! exercised without a database; the PostgreSQL factory lives in
//! [`crate::pg_pool`].

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

/// Errors produced while building or probing a pool.
///
/// Only [`PoolError::Configuration`] is fatal; every other variant is a
/// transient connectivity failure the manager recovers from on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Malformed connection string or inconsistent pool settings
    #[error("Invalid connection configuration: {0}")]
    Configuration(String),

    /// The pool could not be established
    #[error("Failed to connect to database: {0}")]
    Connect(String),

    /// The pool was built but did not answer the liveness probe
    #[error("Database liveness probe failed: {0}")]
    Probe(String),

    /// A connect or probe did not finish within its bound
    #[error("Database {operation} timed out after {after:?}")]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },
}

impl PoolError {
    /// Whether the error must abort startup instead of being retried
    pub fn is_fatal(&self) -> bool {
        matches!(self, PoolError::Configuration(_))
    }
}

/// A live pool the manager can probe and close.
///
/// Implementations must be safe to share between request handlers.
#[async_trait]
pub trait ManagedPool: Send + Sync + 'static {
    /// Minimal round trip confirming the pool currently serves requests
    async fn ping(&self) -> Result<(), PoolError>;

    /// Release every connection held by the pool
    async fn close(&self);
}

/// Builds new pools from the immutable connection template.
#[async_trait]
pub trait PoolFactory: Send + Sync + 'static {
    type Pool: ManagedPool;

    /// Establish a new pool; the manager bounds this with `connect_timeout`
    async fn build(&self, config: &ConnectionConfig) -> Result<Self::Pool, PoolError>;
}

/// Immutable connection template captured when the manager starts.
///
/// Every reconnect attempt builds its pool from the same template.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Connection string including host and credentials
    pub database_url: String,
    /// Upper bound of pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// Maximum lifetime of a single connection
    pub max_lifetime: Duration,
    /// Idle connections are closed after this long
    pub idle_timeout: Duration,
    /// Period of the background health check
    pub health_check_interval: Duration,
    /// Bound on the probe used by the health loop and reconnect attempts
    pub probe_timeout: Duration,
    /// Bound on the probe behind [`PoolManager::is_healthy`]
    pub health_probe_timeout: Duration,
    /// Bound on establishing a new pool
    pub connect_timeout: Duration,
    /// Attempts per reconnect cycle
    pub reconnect_attempts: u32,
    /// Backoff step; the delay after attempt `n` is `n * reconnect_backoff`
    pub reconnect_backoff: Duration,
}

impl ConnectionConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(60 * 60),
            idle_timeout: Duration::from_secs(30 * 60),
            health_check_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            health_probe_timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
            reconnect_attempts: 5,
            reconnect_backoff: Duration::from_secs(2),
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.reconnect_backoff * attempt
    }

    /// Reject settings the manager cannot run with
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.database_url.trim().is_empty() {
            return Err(PoolError::Configuration(
                "database URL cannot be empty".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(PoolError::Configuration(
                "max_connections must be greater than 0".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(PoolError::Configuration(format!(
                "min_connections ({}) cannot exceed max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        if self.reconnect_attempts == 0 {
            return Err(PoolError::Configuration(
                "reconnect_attempts must be greater than 0".to_string(),
            ));
        }

        let bounds = [
            ("health_check_interval", self.health_check_interval),
            ("probe_timeout", self.probe_timeout),
            ("health_probe_timeout", self.health_probe_timeout),
            ("connect_timeout", self.connect_timeout),
        ];
        for (name, value) in bounds {
            if value.is_zero() {
                return Err(PoolError::Configuration(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}

// Credentials live in the URL, keep them out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("database_url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("max_lifetime", &self.max_lifetime)
            .field("idle_timeout", &self.idle_timeout)
            .field("health_check_interval", &self.health_check_interval)
            .field("probe_timeout", &self.probe_timeout)
            .field("health_probe_timeout", &self.health_probe_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("reconnect_attempts", &self.reconnect_attempts)
            .field("reconnect_backoff", &self.reconnect_backoff)
            .finish()
    }
}

/// State shared between the manager and its background task.
struct Shared<F: PoolFactory> {
    factory: F,
    config: ConnectionConfig,
    handle: RwLock<Option<Arc<F::Pool>>>,
    /// Flips to `true` exactly once, at shutdown
    cancel: watch::Sender<bool>,
    /// Held for the whole of a reconnect cycle
    reconnecting: tokio::sync::Mutex<()>,
}

/// Owner of the live database pool.
///
/// Construct it once at startup with [`PoolManager::start`], share it behind
/// an `Arc`, and call [`PoolManager::shutdown`] once during teardown.
pub struct PoolManager<F: PoolFactory> {
    shared: Arc<Shared<F>>,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl<F: PoolFactory> PoolManager<F> {
    /// Validate the template, try one connection and start the health loop.
    ///
    /// A failed initial connection is logged and the manager starts without a
    /// pool; only configuration errors are returned.
    pub async fn start(factory: F, config: ConnectionConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let (cancel, _) = watch::channel(false);
        let shared = Arc::new(Shared {
            factory,
            config,
            handle: RwLock::new(None),
            cancel,
            reconnecting: tokio::sync::Mutex::new(()),
        });

        match shared.connect_once().await {
            Ok(pool) => {
                *shared.handle.write() = Some(Arc::new(pool));
                info!("Successfully connected to database");
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "Initial database connection failed");
                info!("Service will start degraded and reconnect in the background");
            }
        }

        let health_task = tokio::spawn(Arc::clone(&shared).health_check_loop());

        Ok(Self {
            shared,
            health_task: Mutex::new(Some(health_task)),
        })
    }

    /// Current pool, or `None` while degraded or after shutdown
    pub fn get_handle(&self) -> Option<Arc<F::Pool>> {
        self.shared.snapshot()
    }

    /// Whether a pool is installed; performs no I/O
    pub fn is_available(&self) -> bool {
        self.shared.handle.read().is_some()
    }

    /// Probe the current pool, bounded by `health_probe_timeout`
    pub async fn is_healthy(&self) -> bool {
        let Some(pool) = self.get_handle() else {
            return false;
        };

        match probe(pool.as_ref(), self.shared.config.health_probe_timeout).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Health probe failed");
                false
            }
        }
    }

    /// Run one reconnect cycle now; returns whether a pool is installed afterwards
    pub async fn reconnect(&self) -> bool {
        self.shared.reconnect().await
    }

    /// The immutable connection template
    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Stop the health loop and close the live pool. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        if self.shared.cancel.send_replace(true) {
            debug!("Pool manager already shut down");
            return;
        }

        info!("Closing database pool");
        let live = self.shared.handle.write().take();
        if let Some(pool) = live {
            pool.close().await;
        }

        let task = self.health_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Health check task terminated abnormally");
            }
        }

        info!("Database pool manager shut down");
    }
}

impl<F: PoolFactory> Drop for PoolManager<F> {
    fn drop(&mut self) {
        // Lets the background task exit if shutdown was never called.
        self.shared.cancel.send_replace(true);
    }
}

impl<F: PoolFactory> Shared<F> {
    fn snapshot(&self) -> Option<Arc<F::Pool>> {
        self.handle.read().clone()
    }

    fn is_shut_down(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Build one pool and probe it; a pool failing the probe is closed.
    async fn connect_once(&self) -> Result<F::Pool, PoolError> {
        let limit = self.config.connect_timeout;
        let pool = time::timeout(limit, self.factory.build(&self.config))
            .await
            .map_err(|_| PoolError::TimedOut {
                operation: "connect",
                after: limit,
            })??;

        match probe(&pool, self.config.probe_timeout).await {
            Ok(()) => Ok(pool),
            Err(e) => {
                pool.close().await;
                Err(e)
            }
        }
    }

    async fn health_check_loop(self: Arc<Self>) {
        let period = self.config.health_check_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancelled = self.cancel.subscribe();

        while !self.is_shut_down() {
            tokio::select! {
                _ = cancelled.changed() => break,
                _ = ticker.tick() => {}
            }
            self.check_health().await;
        }

        debug!("Health check loop stopped");
    }

    async fn check_health(&self) {
        let Some(pool) = self.snapshot() else {
            warn!("Database pool is absent, attempting to reconnect");
            self.reconnect().await;
            return;
        };

        let outcome = probe(pool.as_ref(), self.config.probe_timeout).await;
        drop(pool);

        match outcome {
            Ok(()) => debug!("Database health check passed"),
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                self.reconnect().await;
            }
        }
    }

    async fn reconnect(&self) -> bool {
        let Ok(_cycle) = self.reconnecting.try_lock() else {
            debug!("Reconnect cycle already in flight");
            return self.handle.read().is_some();
        };
        if self.is_shut_down() {
            return false;
        }

        // The lock only covers the take; closing happens outside it.
        let stale = self.handle.write().take();
        if let Some(pool) = stale {
            pool.close().await;
        }

        let attempts = self.config.reconnect_attempts;
        let mut cancelled = self.cancel.subscribe();

        for attempt in 1..=attempts {
            if self.is_shut_down() {
                info!(attempt, "Shutdown requested, abandoning reconnect cycle");
                return false;
            }

            info!(attempt, max = attempts, "Reconnection attempt");
            match self.connect_once().await {
                Ok(pool) => {
                    let installed = self.install(pool).await;
                    if installed {
                        info!(attempt, "Successfully reconnected to database");
                    }
                    return installed;
                }
                Err(e) => {
                    warn!(attempt, max = attempts, error = %e, "Reconnection attempt failed");
                }
            }

            if attempt < attempts {
                let delay = self.config.backoff_for(attempt);
                debug!(attempt, ?delay, "Backing off before next reconnection attempt");
                tokio::select! {
                    _ = cancelled.changed() => {
                        info!(attempt, "Shutdown requested, abandoning reconnect cycle");
                        return false;
                    }
                    _ = time::sleep(delay) => {}
                }
            }
        }

        error!(attempts, "Failed to reconnect to database, will retry on next health check");
        false
    }

    /// Swap a freshly probed pool in; after shutdown the pool is closed instead.
    async fn install(&self, pool: F::Pool) -> bool {
        let pool = Arc::new(pool);
        let (installed, discarded) = {
            let mut slot = self.handle.write();
            if self.is_shut_down() {
                (false, Some(pool))
            } else {
                (true, slot.replace(pool))
            }
        };

        if let Some(pool) = discarded {
            pool.close().await;
        }
        installed
    }
}

async fn probe<P: ManagedPool>(pool: &P, limit: Duration) -> Result<(), PoolError> {
    time::timeout(limit, pool.ping())
        .await
        .map_err(|_| PoolError::TimedOut {
            operation: "probe",
            after: limit,
        })?
}
