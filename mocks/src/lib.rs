//! Mock implementations and test utilities for the Task API
//!
//! This crate provides:
//! - An in-memory `TaskRepository` with error injection and an outage switch
//! - Fixtures, including the demo backlog
//! - Builders for tasks and list filters

pub mod builders;
pub mod fixtures;
pub mod repository;

pub use builders::*;
pub use fixtures::*;
pub use repository::MockTaskRepository;
