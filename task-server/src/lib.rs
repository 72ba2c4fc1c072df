//! Task API server library
//!
//! Configuration loading, logging setup and the wiring of the pool manager,
//! repository and HTTP server. The `task-server` binary is a thin wrapper.

pub mod config;
pub mod setup;
pub mod telemetry;

pub use config::Config;
pub use setup::{create_pool_manager, create_repository, create_server, initialize_app, App};
pub use telemetry::init_telemetry;
