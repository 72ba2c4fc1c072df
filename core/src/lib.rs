//! Task Core Library
//!
//! This crate provides the domain models, error types, and trait interfaces
//! for the Task API. All other crates depend on the types and interfaces
//! defined here.
//!
//! # Architecture
//!
//! - [`models`] - Domain models (Task, TaskStatus, etc.)
//! - [`error`] - Error types and result handling
//! - [`repository`] - Repository trait for data persistence
//! - [`validation`] - Field validation rules
//!
//! # Example
//!
//! ```rust
//! use task_core::{models::NewTask, validation::TaskValidator};
//!
//! let new_task = NewTask::new("Learn async Rust", "Write a worker pool with channels");
//!
//! // Validate the task before creation
//! TaskValidator::validate_new_task(&new_task).unwrap();
//! ```

pub mod error;
pub mod models;
pub mod repository;
pub mod validation;

// Re-export commonly used types at the crate root for convenience
pub use error::{Result, TaskError};
pub use models::{NewTask, Task, TaskFilter, TaskStatus, UpdateTask, DEFAULT_PRIORITY};
pub use repository::TaskRepository;
pub use validation::TaskValidator;

/// Current version of the core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
