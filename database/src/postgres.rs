use crate::{
    common::{build_list_query, row_to_task, sqlx_error_to_task_error, TASK_COLUMNS},
    pg_pool::PgPoolManager,
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use task_core::{
    error::{Result, TaskError},
    models::{NewTask, Task, TaskFilter, UpdateTask},
    repository::TaskRepository,
    validation::TaskValidator,
};
use tracing::{info, warn};

/// PostgreSQL implementation of the TaskRepository trait
///
/// Every call fetches the current pool from the [`PgPoolManager`]. While the
/// manager is degraded the call fails fast with `TaskError::Unavailable`
/// and no query is attempted.
#[derive(Clone)]
pub struct PgTaskRepository {
    pools: Arc<PgPoolManager>,
}

impl PgTaskRepository {
    pub fn new(pools: Arc<PgPoolManager>) -> Self {
        Self { pools }
    }

    /// Apply pending migrations from `migrations/postgres`
    ///
    /// # Returns
    /// * `Ok(())` - Migrations completed successfully
    /// * `Err(TaskError::Unavailable)` - No live pool to migrate through
    /// * `Err(TaskError::Database)` - If a migration fails
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool("migrate")?;
        sqlx::migrate!("./migrations/postgres")
            .run(pool.as_ref())
            .await
            .map_err(|e| TaskError::Database(format!("Migration failed: {e}")))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    fn pool(&self, operation: &'static str) -> Result<Arc<PgPool>> {
        self.pools.get_handle().ok_or_else(|| {
            warn!(operation, "Database is unavailable, rejecting request");
            TaskError::unavailable()
        })
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let pool = self.pool("list")?;

        let rows = build_list_query(&filter)
            .build()
            .fetch_all(pool.as_ref())
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to query tasks");
                sqlx_error_to_task_error(e)
            })?;

        let tasks = rows.iter().map(row_to_task).collect::<Result<Vec<_>>>()?;
        info!(count = tasks.len(), "Retrieved tasks");
        Ok(tasks)
    }

    async fn create(&self, task: NewTask) -> Result<Task> {
        TaskValidator::validate_new_task(&task)?;
        let pool = self.pool("create")?;

        let row = sqlx::query(&format!(
            "INSERT INTO md.tasks (title, description, status, priority) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.resolved_status().as_str())
        .bind(task.resolved_priority())
        .fetch_one(pool.as_ref())
        .await
        .map_err(|e| {
            warn!(error = %e, title = %task.title, "Failed to create task");
            sqlx_error_to_task_error(e)
        })?;

        let created = row_to_task(&row)?;
        info!(task_id = created.id, title = %created.title, "Task created successfully");
        Ok(created)
    }

    async fn get_by_id(&self, id: i32) -> Result<Option<Task>> {
        let pool = self.pool("get_by_id")?;

        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM md.tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool.as_ref())
            .await
            .map_err(sqlx_error_to_task_error)?;

        match row {
            Some(row) => Ok(Some(row_to_task(&row)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: i32, updates: UpdateTask) -> Result<Task> {
        TaskValidator::validate_update(&updates)?;

        if updates.is_empty() {
            // Nothing to write, return the current row
            return self
                .get_by_id(id)
                .await?
                .ok_or_else(|| TaskError::not_found_id(id));
        }

        let pool = self.pool("update")?;

        let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
            sqlx::QueryBuilder::new("UPDATE md.tasks SET ");
        {
            let mut fields = query_builder.separated(", ");
            if let Some(title) = &updates.title {
                fields.push("title = ");
                fields.push_bind_unseparated(title.clone());
            }
            if let Some(description) = &updates.description {
                fields.push("description = ");
                fields.push_bind_unseparated(description.clone());
            }
            if let Some(status) = updates.status {
                fields.push("status = ");
                fields.push_bind_unseparated(status.as_str());
            }
            if let Some(priority) = updates.priority {
                fields.push("priority = ");
                fields.push_bind_unseparated(priority);
            }
            fields.push("updated_at = now()");
        }
        query_builder.push(" WHERE id = ");
        query_builder.push_bind(id);
        query_builder.push(format!(" RETURNING {TASK_COLUMNS}"));

        let row = query_builder
            .build()
            .fetch_optional(pool.as_ref())
            .await
            .map_err(|e| {
                warn!(error = %e, task_id = id, "Failed to update task");
                sqlx_error_to_task_error(e)
            })?
            .ok_or_else(|| TaskError::not_found_id(id))?;

        let updated = row_to_task(&row)?;
        info!(task_id = id, "Task updated successfully");
        Ok(updated)
    }

    async fn delete(&self, id: i32) -> Result<()> {
        let pool = self.pool("delete")?;

        let result = sqlx::query("DELETE FROM md.tasks WHERE id = $1")
            .bind(id)
            .execute(pool.as_ref())
            .await
            .map_err(sqlx_error_to_task_error)?;

        if result.rows_affected() == 0 {
            return Err(TaskError::not_found_id(id));
        }

        info!(task_id = id, "Task deleted");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        if self.pools.is_healthy().await {
            Ok(())
        } else {
            Err(TaskError::unavailable())
        }
    }
}
