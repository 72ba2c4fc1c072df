//! HTTP server and router
//!
//! `/health` is open to load balancers; everything under `/api` sits behind
//! the API key check.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use task_core::TaskRepository;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    auth::{require_api_key, ApiKeyAuth},
    handler::{self, AppState},
    request_logger::request_logging_middleware,
};

/// The Task API server
pub struct ApiServer {
    state: AppState,
    auth: ApiKeyAuth,
}

impl ApiServer {
    pub fn new(repository: Arc<dyn TaskRepository>, auth: ApiKeyAuth) -> Self {
        if !auth.is_enabled() {
            warn!("No API key configured, /api routes are unauthenticated");
        }

        Self {
            state: AppState::new(repository),
            auth,
        }
    }

    /// Build the router with all endpoints
    pub fn router(&self) -> Router {
        let api = Router::new()
            .route("/health", get(handler::liveness))
            .route("/task/list", get(handler::list_tasks))
            .route("/task/create", post(handler::create_task))
            .route(
                "/task/:id",
                get(handler::get_task)
                    .put(handler::update_task)
                    .delete(handler::delete_task),
            )
            .route_layer(middleware::from_fn_with_state(
                self.auth.clone(),
                require_api_key,
            ));

        Router::new()
            .route("/health", get(handler::health))
            .nest("/api", api)
            .layer(middleware::from_fn(request_logging_middleware))
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    ///
    /// # Arguments
    /// * `listener` - Bound TCP listener
    /// * `shutdown` - Resolves when the server should stop accepting connections
    pub async fn serve<S>(self, listener: TcpListener, shutdown: S) -> std::io::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        info!(%addr, "Task API listening");

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}
