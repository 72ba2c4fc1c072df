//! Standard test fixtures for consistent testing

use chrono::{Duration, Utc};
use task_core::{NewTask, Task, TaskStatus, UpdateTask, DEFAULT_PRIORITY};

/// Create a basic test task with sensible defaults
pub fn create_test_task() -> Task {
    let now = Utc::now();
    Task {
        id: 1,
        title: "Test Task".to_string(),
        description: "A standard test task with default values".to_string(),
        status: TaskStatus::Pending,
        priority: DEFAULT_PRIORITY,
        created_at: now,
        updated_at: now,
    }
}

/// Create task with specific status
pub fn create_test_task_with_status(status: TaskStatus) -> Task {
    Task {
        status,
        ..create_test_task()
    }
}

/// The demo backlog loaded into a fresh database.
///
/// Creation times are one hour apart, with task 1 the oldest, so the
/// newest-first listing order is fully determined.
pub fn seed_tasks() -> Vec<Task> {
    let rows = [
        ("Learn async Rust", "Work through tasks, channels and select", TaskStatus::InProgress, 2),
        ("Set up Docker", "Compose file for the API and PostgreSQL", TaskStatus::Completed, 3),
        ("Write tests", "Cover handlers and the core business logic", TaskStatus::Pending, 2),
        ("Go shopping", "Milk, bread, coffee", TaskStatus::Pending, 4),
        ("Review PR #142", "Check the pagination changes", TaskStatus::InProgress, 1),
        ("Fix CORS bug", "Preflight requests fail from the admin UI", TaskStatus::Pending, 1),
        ("Update README", "Document the new endpoints", TaskStatus::Completed, 5),
    ];

    let oldest = Utc::now() - Duration::hours(rows.len() as i64);
    rows.into_iter()
        .enumerate()
        .map(|(i, (title, description, status, priority))| {
            let created_at = oldest + Duration::hours(i as i64);
            Task {
                id: i as i32 + 1,
                title: title.to_string(),
                description: description.to_string(),
                status,
                priority,
                created_at,
                updated_at: created_at,
            }
        })
        .collect()
}

/// A request body that passes validation
pub fn create_valid_new_task() -> NewTask {
    NewTask::new("Write tests", "Cover handlers and the core business logic")
}

/// A new task whose title is too long to be accepted
pub fn create_oversized_new_task() -> NewTask {
    NewTask::new("x".repeat(201), "")
}

/// An update that marks a task as done
pub fn create_completion_update() -> UpdateTask {
    UpdateTask {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use task_core::TaskValidator;

    #[test]
    fn test_seed_tasks_are_valid_and_ordered() {
        let tasks = seed_tasks();
        assert_eq!(tasks.len(), 7);
        assert!(tasks.windows(2).all(|pair| pair[0].created_at < pair[1].created_at));

        for task in &tasks {
            assert!(TaskValidator::validate_title(&task.title).is_ok());
            assert!(TaskValidator::validate_priority(task.priority).is_ok());
        }
    }

    #[test]
    fn test_new_task_fixtures() {
        assert!(TaskValidator::validate_new_task(&create_valid_new_task()).is_ok());
        assert!(TaskValidator::validate_new_task(&create_oversized_new_task()).is_err());
        assert!(!create_completion_update().is_empty());
    }
}
