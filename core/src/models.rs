use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Priority assigned when a new task does not specify one (or sends 0)
pub const DEFAULT_PRIORITY: i32 = 3;

/// Lowest accepted priority value
pub const MIN_PRIORITY: i32 = 1;

/// Highest accepted priority value
pub const MAX_PRIORITY: i32 = 5;

/// Core task representation.
///
/// A task is a unit of work stored as one row of the `md.tasks` table.
/// `updated_at` moves forward on every successful update.
///
/// # Examples
///
/// ```rust
/// use task_core::models::{Task, TaskStatus};
/// use chrono::Utc;
///
/// let now = Utc::now();
/// let task = Task {
///     id: 1,
///     title: "Set up Docker".to_string(),
///     description: "Dockerfile plus docker-compose with PostgreSQL".to_string(),
///     status: TaskStatus::Pending,
///     priority: 3,
///     created_at: now,
///     updated_at: now,
/// };
///
/// assert!(!task.is_completed());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Auto-increment primary key
    pub id: i32,
    /// Brief task title
    pub title: String,
    /// Free-form details, may be empty
    pub description: String,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// 1 (lowest) to 5 (highest)
    pub priority: i32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether the task has reached the `completed` status
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Task lifecycle status.
///
/// Stored as snake_case text in the `status` column and serialized the same
/// way on the wire.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Finished
    Completed,
}

impl TaskStatus {
    /// All statuses in lifecycle order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Storage and wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = crate::error::TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(crate::error::TaskError::Validation(format!(
                "Invalid task status: '{other}'. Must be one of: pending, in_progress, completed"
            ))),
        }
    }
}

/// Data transfer object for creating new tasks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewTask {
    /// Brief task title
    pub title: String,
    /// Free-form details
    #[serde(default)]
    pub description: String,
    /// Initial status, `pending` when absent
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Priority, [`DEFAULT_PRIORITY`] when absent or zero
    #[serde(default)]
    pub priority: Option<i32>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: None,
            priority: None,
        }
    }

    /// Status to store for this task
    pub fn resolved_status(&self) -> TaskStatus {
        self.status.unwrap_or_default()
    }

    /// Priority to store for this task; a zero priority means "not set"
    pub fn resolved_priority(&self) -> i32 {
        match self.priority {
            None | Some(0) => DEFAULT_PRIORITY,
            Some(priority) => priority,
        }
    }
}

/// Data transfer object for updating existing tasks.
///
/// Only fields that are `Some` are written.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UpdateTask {
    /// Optional new title
    pub title: Option<String>,
    /// Optional new description
    pub description: Option<String>,
    /// Optional new status
    pub status: Option<TaskStatus>,
    /// Optional new priority
    pub priority: Option<i32>,
}

impl UpdateTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }

    /// Apply the provided fields to an in-memory task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
    }
}

/// Filter criteria for listing tasks.
///
/// All fields are optional; results are ordered newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskFilter {
    /// Filter by status
    pub status: Option<TaskStatus>,
    /// Maximum number of tasks to return (for pagination)
    pub limit: Option<u32>,
    /// Number of tasks to skip (for pagination)
    pub offset: Option<u32>,
}
