//! HTTP API for the task service
//!
//! This crate exposes a [`TaskRepository`] over HTTP with axum:
//!
//! - `GET /health` - database connectivity (200 or 503), unauthenticated
//! - `GET /api/health` - process liveness
//! - `GET /api/task/list`, `POST /api/task/create`
//! - `GET|PUT|DELETE /api/task/:id`
//!
//! While the database is unreachable, task routes answer 503 with a
//! `Retry-After` header instead of waiting for a connection.
//!
//! # Usage
//!
//! ```no_run
//! use http_api::{ApiKeyAuth, ApiServer};
//! use std::sync::Arc;
//! # use task_core::TaskRepository;
//!
//! async fn run(repository: Arc<dyn TaskRepository>) -> std::io::Result<()> {
//!     let server = ApiServer::new(repository, ApiKeyAuth::new("local-dev-key"));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     server.serve(listener, std::future::pending()).await
//! }
//! ```

pub mod auth;
pub mod error;
pub mod handler;
pub mod request_logger;
pub mod serialization;
pub mod server;

pub use auth::ApiKeyAuth;
pub use error::ApiError;
pub use handler::AppState;
pub use serialization::*;
pub use server::ApiServer;

pub use task_core::{Task, TaskRepository, TaskStatus};
