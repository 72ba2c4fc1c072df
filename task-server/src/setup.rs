use anyhow::{Context, Result};
use database::{PgPoolManager, PgTaskRepository, TaskError};
use http_api::{ApiKeyAuth, ApiServer};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::oneshot};
use tracing::{error, info, warn};

use crate::config::Config;

/// Everything the process runs: the HTTP server and the pool it reads from
pub struct App {
    pub server: ApiServer,
    pub pools: Arc<PgPoolManager>,
}

/// Start the pool manager.
///
/// An unreachable database is not an error here: the manager comes up
/// degraded and keeps reconnecting in the background. Only a malformed
/// connection configuration fails.
pub async fn create_pool_manager(config: &Config) -> Result<Arc<PgPoolManager>> {
    let connection = config
        .connection_config()
        .context("Failed to build connection configuration")?;

    let pools = PgPoolManager::connect_postgres(connection)
        .await
        .context("Invalid database connection configuration")?;

    if pools.is_available() {
        info!("Database pool ready");
    } else {
        warn!("Starting without a database connection, requests will get 503 until it recovers");
    }
    Ok(Arc::new(pools))
}

/// Create the task repository, applying migrations when possible
pub async fn create_repository(
    config: &Config,
    pools: Arc<PgPoolManager>,
) -> Result<Arc<PgTaskRepository>> {
    let repository = PgTaskRepository::new(pools);

    if config.database.run_migrations {
        match repository.migrate().await {
            Ok(()) => {}
            // Schema is applied on a later start once the database is back.
            Err(TaskError::Unavailable(_)) => {
                warn!("Database unavailable, skipping migrations");
            }
            Err(e) => return Err(e).context("Failed to run database migrations"),
        }
    }

    Ok(Arc::new(repository))
}

/// Create the HTTP server over the repository
pub fn create_server(config: &Config, repository: Arc<PgTaskRepository>) -> ApiServer {
    ApiServer::new(repository, ApiKeyAuth::new(config.auth.api_key.clone()))
}

/// Initialize the complete application
pub async fn initialize_app(config: &Config) -> Result<App> {
    info!("Initializing application");

    let pools = create_pool_manager(config).await?;
    let repository = create_repository(config, Arc::clone(&pools)).await?;
    let server = create_server(config, repository);

    info!("Application initialized successfully");
    Ok(App { server, pools })
}

impl App {
    /// Serve until `signal` resolves, then drain requests and close the pool.
    ///
    /// Draining is bounded by `shutdown_timeout`; requests still running at
    /// the deadline are abandoned. The pool manager is shut down in every
    /// case, under a bound of its own.
    pub async fn run_until_shutdown<S>(
        self,
        listener: TcpListener,
        signal: S,
        shutdown_timeout: Duration,
    ) -> Result<()>
    where
        S: Future<Output = ()> + Send,
    {
        let App { server, pools } = self;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let mut serving = tokio::spawn(server.serve(listener, async move {
            let _ = stop_rx.await;
        }));

        tokio::select! {
            outcome = &mut serving => {
                // Server stopped without a shutdown request
                pools.shutdown().await;
                return match outcome {
                    Ok(result) => result.context("HTTP server failed"),
                    Err(e) => Err(e).context("HTTP server task panicked"),
                };
            }
            _ = signal => {}
        }

        info!(timeout = ?shutdown_timeout, "Shutdown requested, draining in-flight requests");
        let _ = stop_tx.send(());

        match tokio::time::timeout(shutdown_timeout, &mut serving).await {
            Ok(Ok(Ok(()))) => info!("HTTP server stopped"),
            Ok(Ok(Err(e))) => error!(error = %e, "HTTP server failed while draining"),
            Ok(Err(e)) => error!(error = %e, "HTTP server task panicked while draining"),
            Err(_) => {
                warn!(timeout = ?shutdown_timeout, "Requests still in flight, abandoning drain");
                serving.abort();
            }
        }

        // The manager is cancelled and its handle cleared before any awaited
        // close, so an expired bound still leaves it shut down.
        if tokio::time::timeout(shutdown_timeout, pools.shutdown())
            .await
            .is_err()
        {
            warn!(timeout = ?shutdown_timeout, "Database pool did not close in time");
        }

        info!("Shutdown complete");
        Ok(())
    }
}
