//! Request and response bodies of the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use task_core::{NewTask, Task, TaskFilter, TaskStatus, UpdateTask};

/// Body of `POST /api/task/create`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Absent or 0 means the default priority
    #[serde(default)]
    pub priority: Option<i32>,
}

impl From<CreateTaskRequest> for NewTask {
    fn from(request: CreateTaskRequest) -> Self {
        NewTask {
            title: request.title,
            description: request.description,
            status: request.status,
            priority: request.priority,
        }
    }
}

/// Body of `PUT /api/task/:id`; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(request: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: request.title,
            description: request.description,
            status: request.status,
            priority: request.priority,
        }
    }
}

/// Query string of `GET /api/task/list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<TaskStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<ListQuery> for TaskFilter {
    fn from(query: ListQuery) -> Self {
        TaskFilter {
            status: query.status,
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// A task as returned to API clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskListResponse {
    pub list: Vec<TaskResponse>,
}

impl From<Vec<Task>> for TaskListResponse {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            list: tasks.into_iter().map(TaskResponse::from).collect(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub database: DatabaseHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseHealth {
    pub connected: bool,
}

impl HealthResponse {
    pub fn from_connected(connected: bool) -> Self {
        let status = if connected { "ok" } else { "degraded" };
        Self {
            status: status.to_string(),
            database: DatabaseHealth { connected },
        }
    }
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LivenessResponse {
    pub status: String,
    pub time: DateTime<Utc>,
}
