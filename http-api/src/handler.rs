//! Route handlers
//!
//! Handlers never wait for the database to come back: the repository fails
//! fast with `TaskError::Unavailable`, which turns into a retryable 503.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use task_core::{TaskRepository, TaskValidator};
use tracing::debug;

use crate::{
    error::ApiError,
    serialization::{
        CreateTaskRequest, HealthResponse, ListQuery, LivenessResponse, TaskListResponse,
        TaskResponse, UpdateTaskRequest,
    },
};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TaskRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }
}

/// `GET /health`: database connectivity, 503 while degraded
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let connected = match state.repository.health_check().await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "Health check reports database disconnected");
            false
        }
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(HealthResponse::from_connected(connected)))
}

/// `GET /api/health`: process liveness, no database access
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
        time: Utc::now(),
    })
}

pub async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let tasks = state.repository.list(query.into()).await?;
    Ok(Json(tasks.into()))
}

pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let task = state.repository.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

pub async fn get_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = task_id(id)?;

    state
        .repository
        .get_by_id(id)
        .await?
        .map(|task| Json(task.into()))
        .ok_or_else(|| ApiError::NotFound(format!("Task with ID {id} not found")))
}

pub async fn update_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<TaskResponse>, ApiError> {
    let id = task_id(id)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let task = state.repository.update(id, request.into()).await?;
    Ok(Json(task.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = task_id(id)?;

    state.repository.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn task_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    TaskValidator::validate_id(id)?;
    Ok(id)
}
