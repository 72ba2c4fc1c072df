use async_trait::async_trait;
use crate::{
    error::Result,
    models::{NewTask, Task, TaskFilter, UpdateTask},
};

/// Repository trait for task persistence and retrieval operations
///
/// Implementations must be thread-safe and support concurrent access.
/// Every operation reports a missing database connection as
/// `TaskError::Unavailable` so callers can tell "retry later" apart from a
/// genuine database failure.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// List tasks matching the given filter, newest first
    ///
    /// # Returns
    /// * `Ok(Vec<Task>)` - The matching tasks (may be empty)
    /// * `Err(TaskError::Unavailable)` - If no database connection is live
    /// * `Err(TaskError::Database)` - If the query fails
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>>;

    /// Create a new task
    ///
    /// # Returns
    /// * `Ok(Task)` - The created task with assigned ID and timestamps
    /// * `Err(TaskError::Validation)` - If the task data is invalid
    /// * `Err(TaskError::Unavailable)` - If no database connection is live
    /// * `Err(TaskError::Database)` - If the insert fails
    async fn create(&self, task: NewTask) -> Result<Task>;

    /// Get a task by its numeric ID
    ///
    /// # Returns
    /// * `Ok(Some(Task))` - The task if found
    /// * `Ok(None)` - If no task exists with that ID
    /// * `Err(TaskError::Unavailable)` - If no database connection is live
    async fn get_by_id(&self, id: i32) -> Result<Option<Task>>;

    /// Update an existing task; only `Some` fields are written
    ///
    /// # Returns
    /// * `Ok(Task)` - The updated task
    /// * `Err(TaskError::NotFound)` - If the task doesn't exist
    /// * `Err(TaskError::Validation)` - If the update data is invalid
    /// * `Err(TaskError::Unavailable)` - If no database connection is live
    async fn update(&self, id: i32, updates: UpdateTask) -> Result<Task>;

    /// Delete a task
    ///
    /// # Returns
    /// * `Ok(())` - The task was removed
    /// * `Err(TaskError::NotFound)` - If the task doesn't exist
    /// * `Err(TaskError::Unavailable)` - If no database connection is live
    async fn delete(&self, id: i32) -> Result<()>;

    /// Get repository health status for monitoring
    ///
    /// # Returns
    /// * `Ok(())` - Repository is healthy and connected
    /// * `Err(TaskError::Unavailable)` - No live connection
    async fn health_check(&self) -> Result<()>;
}
