//! Mock implementation of TaskRepository trait
//!
//! Provides a thread-safe in-memory repository with:
//! - Error injection, either for the next call or until cleared
//! - A switchable "database down" mode mirroring a degraded pool manager
//! - Call tracking for verification

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use task_core::{
    NewTask, Result, Task, TaskError, TaskFilter, TaskRepository, TaskValidator, UpdateTask,
};

/// Mock implementation of TaskRepository for testing
///
/// Validation runs through the same [`TaskValidator`] the PostgreSQL
/// repository uses, so handlers see identical error variants.
#[derive(Clone)]
pub struct MockTaskRepository {
    tasks: Arc<Mutex<BTreeMap<i32, Task>>>,
    next_id: Arc<AtomicI32>,
    error_injection: Arc<Mutex<Option<TaskError>>>,
    unavailable: Arc<AtomicBool>,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl Default for MockTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTaskRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::with_tasks(Vec::new())
    }

    /// Create mock repository with pre-populated tasks
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let max_id = tasks.iter().map(|task| task.id).max().unwrap_or(0);
        let tasks = tasks.into_iter().map(|task| (task.id, task)).collect();

        Self {
            tasks: Arc::new(Mutex::new(tasks)),
            next_id: Arc::new(AtomicI32::new(max_id + 1)),
            error_injection: Arc::new(Mutex::new(None)),
            unavailable: Arc::new(AtomicBool::new(false)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Inject error for next operation
    pub fn inject_error(&self, error: TaskError) {
        *self.error_injection.lock() = Some(error);
    }

    /// Clear error injection
    pub fn clear_error(&self) {
        *self.error_injection.lock() = None;
    }

    /// Simulate the database going away (or coming back).
    ///
    /// While down every operation fails with `TaskError::Unavailable` and
    /// `health_check` reports unhealthy.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Get history of called methods
    pub fn call_history(&self) -> Vec<String> {
        self.call_history.lock().clone()
    }

    /// Clear call history
    pub fn clear_history(&self) {
        self.call_history.lock().clear();
    }

    /// Assert method was called
    pub fn assert_called(&self, method: &str) {
        let history = self.call_history.lock();
        assert!(
            history.iter().any(|call| call.starts_with(method)),
            "Method '{}' was not called. Call history: {:?}",
            method,
            *history
        );
    }

    /// Assert method was never called
    pub fn assert_not_called(&self, method: &str) {
        let history = self.call_history.lock();
        assert!(
            !history.iter().any(|call| call.starts_with(method)),
            "Method '{}' was called. Call history: {:?}",
            method,
            *history
        );
    }

    /// Number of stored tasks
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Check the simulated connectivity and any injected error
    fn check_error_injection(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(TaskError::unavailable());
        }
        if let Some(error) = self.error_injection.lock().take() {
            return Err(error);
        }
        Ok(())
    }

    fn record_call(&self, method: &str, params: &str) {
        self.call_history.lock().push(format!("{method}({params})"));
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.record_call("list", &format!("{filter:?}"));
        self.check_error_injection()?;

        let tasks = self.tasks.lock();
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|task| filter.status.map_or(true, |status| task.status == status))
            .cloned()
            .collect();
        drop(tasks);

        // Same ordering as the SQL query: newest first, id as tie breaker
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn create(&self, task: NewTask) -> Result<Task> {
        self.record_call("create", &format!("title={}", task.title));
        TaskValidator::validate_new_task(&task)?;
        self.check_error_injection()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let created = Task {
            id,
            status: task.resolved_status(),
            priority: task.resolved_priority(),
            title: task.title,
            description: task.description,
            created_at: now,
            updated_at: now,
        };

        self.tasks.lock().insert(id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>> {
        self.record_call("get_by_id", &format!("id={id}"));
        self.check_error_injection()?;

        Ok(self.tasks.lock().get(&id).cloned())
    }

    async fn update(&self, id: i32, updates: UpdateTask) -> Result<Task> {
        self.record_call("update", &format!("id={id}"));
        TaskValidator::validate_update(&updates)?;
        self.check_error_injection()?;

        let mut tasks = self.tasks.lock();
        let task = tasks.get_mut(&id).ok_or_else(|| TaskError::not_found_id(id))?;
        if !updates.is_empty() {
            updates.apply_to(task);
            task.updated_at = Utc::now();
        }
        Ok(task.clone())
    }

    async fn delete(&self, id: i32) -> Result<()> {
        self.record_call("delete", &format!("id={id}"));
        self.check_error_injection()?;

        self.tasks
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| TaskError::not_found_id(id))
    }

    async fn health_check(&self) -> Result<()> {
        self.record_call("health_check", "");
        self.check_error_injection()
    }
}
