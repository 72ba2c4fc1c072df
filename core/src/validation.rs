use crate::{
    error::{Result, TaskError},
    models::{NewTask, UpdateTask, MAX_PRIORITY, MIN_PRIORITY},
};

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 200;

/// Maximum description length in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Validation utilities for task operations
pub struct TaskValidator;

impl TaskValidator {
    /// Validate a task title
    ///
    /// Titles must not be blank and must be at most
    /// [`MAX_TITLE_LENGTH`] characters long.
    pub fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(TaskError::empty_field("title"));
        }

        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(TaskError::Validation(format!(
                "Title must be at most {MAX_TITLE_LENGTH} characters long"
            )));
        }

        Ok(())
    }

    /// Validate a task description; empty descriptions are allowed
    pub fn validate_description(description: &str) -> Result<()> {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(TaskError::Validation(format!(
                "Description must be at most {MAX_DESCRIPTION_LENGTH} characters long"
            )));
        }
        Ok(())
    }

    /// Validate a priority value
    pub fn validate_priority(priority: i32) -> Result<()> {
        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
            return Err(TaskError::Validation(format!(
                "Priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}, got {priority}"
            )));
        }
        Ok(())
    }

    /// Validate a task ID taken from a request path
    pub fn validate_id(id: i32) -> Result<()> {
        if id <= 0 {
            return Err(TaskError::Validation(format!(
                "Task ID must be a positive integer, got {id}"
            )));
        }
        Ok(())
    }

    /// Validate a complete new task after defaults are applied
    pub fn validate_new_task(task: &NewTask) -> Result<()> {
        Self::validate_title(&task.title)?;
        Self::validate_description(&task.description)?;
        Self::validate_priority(task.resolved_priority())?;
        Ok(())
    }

    /// Validate the provided fields of an update
    pub fn validate_update(updates: &UpdateTask) -> Result<()> {
        if let Some(title) = &updates.title {
            Self::validate_title(title)?;
        }
        if let Some(description) = &updates.description {
            Self::validate_description(description)?;
        }
        if let Some(priority) = updates.priority {
            Self::validate_priority(priority)?;
        }
        Ok(())
    }
}
