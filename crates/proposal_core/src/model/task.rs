//! Task domain model.
//!
//! # Responsibility
//! - Define a unit of work owned by exactly one proposal.
//! - Keep progress and completion consistent on every mutation.
//!
//! # Invariants
//! - `status.progress` is within `0..=100`.
//! - `status.progress == 100` implies `completed == true`.
//! - `proposal_id` is a back-reference; ownership lives in `Proposal::tasks`.

use crate::util::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type TaskId = Uuid;

/// Coarse task state shown on task cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    NotStarted,
    InProgress,
    Completed,
}

impl TaskState {
    fn for_progress(progress: u8) -> Self {
        match progress {
            0 => Self::NotStarted,
            100.. => Self::Completed,
            _ => Self::InProgress,
        }
    }
}

/// Mutable progress snapshot of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub state: TaskState,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub updated_at: DateTime<Utc>,
}

/// Validation errors for task invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskValidationError {
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("task progress {0} is outside 0..=100")]
    ProgressOutOfRange(u8),
    #[error("task at 100% progress must be marked completed")]
    IncompleteAtFullProgress,
    #[error("task {0} cannot depend on itself")]
    SelfDependency(TaskId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub proposal_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Lower numbers sort first.
    pub priority: i32,
    pub dependencies: Vec<TaskId>,
    pub status: TaskProgress,
}

#[derive(Deserialize)]
struct TaskRecord {
    id: TaskId,
    proposal_id: Uuid,
    title: String,
    description: Option<String>,
    owner: Option<String>,
    due_date: Option<DateTime<Utc>>,
    completed: bool,
    created_at: DateTime<Utc>,
    priority: i32,
    #[serde(default)]
    dependencies: Vec<TaskId>,
    status: TaskProgress,
}

impl TryFrom<TaskRecord> for Task {
    type Error = TaskValidationError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let task = Self {
            id: record.id,
            proposal_id: record.proposal_id,
            title: record.title,
            description: record.description,
            owner: record.owner,
            due_date: record.due_date,
            completed: record.completed,
            created_at: record.created_at,
            priority: record.priority,
            dependencies: record.dependencies,
            status: record.status,
        };
        task.validate()?;
        Ok(task)
    }
}

impl Task {
    /// Creates an open task attached to `proposal_id`.
    pub fn new(proposal_id: Uuid, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            proposal_id,
            title: title.into(),
            description: None,
            owner: None,
            due_date: None,
            completed: false,
            created_at: now,
            priority: 0,
            dependencies: Vec::new(),
            status: TaskProgress {
                state: TaskState::NotStarted,
                progress: 0,
                updated_at: now,
            },
        }
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        if self.status.progress > 100 {
            return Err(TaskValidationError::ProgressOutOfRange(self.status.progress));
        }
        if self.status.progress == 100 && !self.completed {
            return Err(TaskValidationError::IncompleteAtFullProgress);
        }
        if self.dependencies.contains(&self.id) {
            return Err(TaskValidationError::SelfDependency(self.id));
        }
        Ok(())
    }

    /// Sets progress, clamped to 100. Reaching 100 completes the task;
    /// dropping below 100 reopens it.
    pub fn set_progress(&mut self, progress: u8, now: DateTime<Utc>) {
        let progress = progress.min(100);
        self.completed = progress == 100;
        self.status = TaskProgress {
            state: TaskState::for_progress(progress),
            progress,
            updated_at: now,
        };
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.set_progress(100, now);
    }

    pub fn reopen(&mut self, now: DateTime<Utc>) {
        self.set_progress(0, now);
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskState, TaskValidationError};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn full_progress_completes_and_partial_reopens() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut task = Task::new(Uuid::new_v4(), "outline volume I", now);

        task.set_progress(250, now);
        assert_eq!(task.status.progress, 100);
        assert!(task.completed);
        assert_eq!(task.status.state, TaskState::Completed);

        task.set_progress(40, now);
        assert!(!task.completed);
        assert_eq!(task.status.state, TaskState::InProgress);
    }

    #[test]
    fn validate_rejects_self_dependency() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut task = Task::new(Uuid::new_v4(), "price volume", now);
        task.dependencies.push(task.id);
        assert_eq!(
            task.validate().unwrap_err(),
            TaskValidationError::SelfDependency(task.id)
        );
    }
}
