use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Row};
use task_core::{
    error::{Result, TaskError},
    models::{Task, TaskFilter, TaskStatus},
};

/// Column list shared by every query returning whole tasks
pub const TASK_COLUMNS: &str =
    "id, title, description, status, priority, created_at, updated_at";

/// Convert string from database to TaskStatus enum
pub fn string_to_status(s: &str) -> Result<TaskStatus> {
    s.parse::<TaskStatus>()
        .map_err(|_| TaskError::Database(format!("Invalid task status in database: {s}")))
}

/// Convert a PostgreSQL row to the Task model.
///
/// Columns are read by name, so the mapping does not depend on the order of
/// the select list.
pub fn row_to_task(row: &PgRow) -> Result<Task> {
    let status: String = row.try_get("status").map_err(sqlx_error_to_task_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(sqlx_error_to_task_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(sqlx_error_to_task_error)?;

    Ok(Task {
        id: row.try_get("id").map_err(sqlx_error_to_task_error)?,
        title: row.try_get("title").map_err(sqlx_error_to_task_error)?,
        description: row.try_get("description").map_err(sqlx_error_to_task_error)?,
        status: string_to_status(&status)?,
        priority: row.try_get("priority").map_err(sqlx_error_to_task_error)?,
        created_at,
        updated_at,
    })
}

/// Convert SQLx error to TaskError.
///
/// Failures that mean "no usable connection right now" become
/// [`TaskError::Unavailable`]; everything else is a plain database error.
pub fn sqlx_error_to_task_error(err: sqlx::Error) -> TaskError {
    match &err {
        sqlx::Error::PoolClosed => {
            TaskError::Unavailable("Connection pool was closed".to_string())
        }
        sqlx::Error::PoolTimedOut => {
            TaskError::Unavailable("Connection pool timeout".to_string())
        }
        sqlx::Error::Io(io_err) => TaskError::Unavailable(format!("Database I/O error: {io_err}")),
        sqlx::Error::Database(db_err) => {
            // 23514 check_violation, 23502 not_null_violation
            match db_err.code().as_deref() {
                Some("23514") | Some("23502") => {
                    TaskError::Validation(format!("Constraint violated: {}", db_err.message()))
                }
                _ => TaskError::Database(format!("Database error: {}", db_err.message())),
            }
        }
        sqlx::Error::RowNotFound => {
            // Lookups use fetch_optional; reaching this is a bug in the query
            TaskError::Database("Unexpected RowNotFound error".to_string())
        }
        _ => TaskError::Database(format!("Database operation failed: {err}")),
    }
}

/// Build the task listing query with bound filter values
pub fn build_list_query(filter: &TaskFilter) -> sqlx::QueryBuilder<'static, sqlx::Postgres> {
    let mut query_builder: sqlx::QueryBuilder<sqlx::Postgres> =
        sqlx::QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM md.tasks"));

    if let Some(status) = filter.status {
        query_builder.push(" WHERE status = ");
        query_builder.push_bind(status.as_str());
    }

    query_builder.push(" ORDER BY created_at DESC, id DESC");

    if let Some(limit) = filter.limit {
        query_builder.push(" LIMIT ");
        query_builder.push_bind(i64::from(limit));
    }

    if let Some(offset) = filter.offset {
        query_builder.push(" OFFSET ");
        query_builder.push_bind(i64::from(offset));
    }

    query_builder
}
