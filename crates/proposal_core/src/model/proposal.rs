//! Proposal aggregate.
//!
//! # Responsibility
//! - Define the tracked bid document and everything it owns.
//! - Provide form-level validation (errors block submit, warnings do not).
//! - Keep derived metadata (urgency) refreshable from an injected "now".
//!
//! # Invariants
//! - `updated_at >= created_at`.
//! - `status` is always one of the six lifecycle stages.
//! - Every owned task carries `proposal_id == self.id`.
//! - Task ids are unique within one proposal.

use crate::engine::status::ProposalStatus;
use crate::engine::urgency::{self, UrgencyTier};
use crate::model::file::FileMeta;
use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::util::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

pub type ProposalId = Uuid;

/// Procurement category of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    Commercial,
    LocalState,
    Federal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Planning metadata shown on proposal cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetadata {
    pub urgency: UrgencyTier,
    /// Relative complexity, 1 (trivial) to 10.
    pub complexity_score: u8,
    pub estimated_hours: u32,
    pub team_members: Vec<String>,
    pub risk_level: RiskLevel,
}

/// Result of the last form-level validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationStatus {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Structural invariant violations of the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProposalValidationError {
    #[error("updated_at ({updated_at}) must be >= created_at ({created_at})")]
    UpdatedBeforeCreated {
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
    #[error("task {task_id} belongs to proposal {owner}, not {proposal_id}")]
    ForeignTask {
        task_id: TaskId,
        owner: Uuid,
        proposal_id: ProposalId,
    },
    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),
    #[error("invalid task {task_id}: {source}")]
    InvalidTask {
        task_id: TaskId,
        #[source]
        source: TaskValidationError,
    },
}

/// Form input used to create a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub title: String,
    pub agency: String,
    pub kind: ProposalType,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: String,
}

impl ProposalDraft {
    pub fn new(title: impl Into<String>, agency: impl Into<String>, kind: ProposalType) -> Self {
        Self {
            title: title.into(),
            agency: agency.into(),
            kind,
            due_date: None,
            notes: String::new(),
        }
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProposalRecord")]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub agency: String,
    #[serde(rename = "type")]
    pub kind: ProposalType,
    pub due_date: Option<DateTime<Utc>>,
    pub status: ProposalStatus,
    pub notes: String,
    pub tasks: Vec<Task>,
    pub files: Vec<FileMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub metadata: ProposalMetadata,
    pub validation_status: ValidationStatus,
}

#[derive(Deserialize)]
struct ProposalRecord {
    id: ProposalId,
    title: String,
    agency: String,
    #[serde(rename = "type")]
    kind: ProposalType,
    due_date: Option<DateTime<Utc>>,
    status: ProposalStatus,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    files: Vec<FileMeta>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    metadata: ProposalMetadata,
    #[serde(default)]
    validation_status: ValidationStatus,
}

impl TryFrom<ProposalRecord> for Proposal {
    type Error = ProposalValidationError;

    fn try_from(record: ProposalRecord) -> Result<Self, Self::Error> {
        let proposal = Self {
            id: record.id,
            title: record.title,
            agency: record.agency,
            kind: record.kind,
            due_date: record.due_date,
            status: record.status,
            notes: record.notes,
            tasks: record.tasks,
            files: record.files,
            created_at: record.created_at,
            updated_at: record.updated_at,
            metadata: record.metadata,
            validation_status: record.validation_status,
        };
        proposal.check_invariants()?;
        Ok(proposal)
    }
}

impl Proposal {
    /// Creates a proposal in `Intake` from form input.
    ///
    /// Urgency and validation status are derived immediately.
    pub fn new(draft: ProposalDraft, now: DateTime<Utc>) -> Self {
        let mut proposal = Self {
            id: generate_id(),
            title: draft.title,
            agency: draft.agency,
            kind: draft.kind,
            due_date: draft.due_date,
            status: ProposalStatus::Intake,
            notes: draft.notes,
            tasks: Vec::new(),
            files: Vec::new(),
            created_at: now,
            updated_at: now,
            metadata: ProposalMetadata::default(),
            validation_status: ValidationStatus::default(),
        };
        proposal.refresh_urgency(now);
        proposal.refresh_validation(now);
        proposal
    }

    /// Checks structural invariants of the aggregate.
    pub fn check_invariants(&self) -> Result<(), ProposalValidationError> {
        if self.updated_at < self.created_at {
            return Err(ProposalValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }

        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if task.proposal_id != self.id {
                return Err(ProposalValidationError::ForeignTask {
                    task_id: task.id,
                    owner: task.proposal_id,
                    proposal_id: self.id,
                });
            }
            if !seen.insert(task.id) {
                return Err(ProposalValidationError::DuplicateTask(task.id));
            }
            task.validate()
                .map_err(|source| ProposalValidationError::InvalidTask {
                    task_id: task.id,
                    source,
                })?;
        }
        Ok(())
    }

    /// Form-level validation. Errors block submit; warnings are advisory.
    pub fn validate(&self, now: DateTime<Utc>) -> ValidationStatus {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("title is required".to_string());
        }
        match self.due_date {
            None => errors.push("due date is required".to_string()),
            Some(due) if due < now && self.status != ProposalStatus::Submitted => {
                warnings.push("due date is in the past".to_string());
            }
            Some(_) => {}
        }
        if self.agency.trim().is_empty() {
            warnings.push("agency is not set".to_string());
        }
        if let Some(due) = self.due_date {
            for task in &self.tasks {
                if task.due_date.is_some_and(|task_due| task_due > due) {
                    warnings.push(format!(
                        "task `{}` is due after the proposal deadline",
                        task.title
                    ));
                }
            }
        }
        if let Err(err) = self.check_invariants() {
            errors.push(err.to_string());
        }

        ValidationStatus {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn refresh_validation(&mut self, now: DateTime<Utc>) -> &ValidationStatus {
        self.validation_status = self.validate(now);
        &self.validation_status
    }

    pub fn refresh_urgency(&mut self, now: DateTime<Utc>) -> UrgencyTier {
        self.metadata.urgency = urgency::classify(self.due_date, now);
        self.metadata.urgency
    }

    /// Bumps `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Attaches a task owned by this proposal.
    pub fn add_task(&mut self, task: Task) -> Result<TaskId, ProposalValidationError> {
        if task.proposal_id != self.id {
            return Err(ProposalValidationError::ForeignTask {
                task_id: task.id,
                owner: task.proposal_id,
                proposal_id: self.id,
            });
        }
        if self.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(ProposalValidationError::DuplicateTask(task.id));
        }
        task.validate()
            .map_err(|source| ProposalValidationError::InvalidTask {
                task_id: task.id,
                source,
            })?;

        let task_id = task.id;
        self.tasks.push(task);
        Ok(task_id)
    }

    pub fn remove_task(&mut self, task_id: TaskId) -> Option<Task> {
        let index = self.tasks.iter().position(|task| task.id == task_id)?;
        let removed = self.tasks.remove(index);
        for task in &mut self.tasks {
            task.dependencies.retain(|dependency| *dependency != task_id);
        }
        Some(removed)
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    /// Share of completed tasks, in percent. No tasks means `0`, or `100`
    /// once the proposal is submitted.
    pub fn progress_percent(&self) -> u8 {
        if self.tasks.is_empty() {
            return if self.status.is_terminal() { 100 } else { 0 };
        }
        let done = self.tasks.iter().filter(|task| task.completed).count();
        u8::try_from(done * 100 / self.tasks.len()).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::{Proposal, ProposalDraft, ProposalType, ProposalValidationError};
    use crate::model::task::Task;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn add_task_rejects_foreign_owner() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut proposal = Proposal::new(
            ProposalDraft::new("Bridge survey", "DOT", ProposalType::LocalState),
            now,
        );
        let foreign = Task::new(Uuid::new_v4(), "stray", now);
        let err = proposal.add_task(foreign).unwrap_err();
        assert!(matches!(err, ProposalValidationError::ForeignTask { .. }));
    }

    #[test]
    fn touch_never_precedes_creation() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let mut proposal = Proposal::new(
            ProposalDraft::new("Bridge survey", "DOT", ProposalType::LocalState),
            now,
        );
        proposal.touch(now - Duration::days(3));
        assert_eq!(proposal.updated_at, proposal.created_at);
    }

    #[test]
    fn missing_due_date_blocks_submit() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let proposal = Proposal::new(
            ProposalDraft::new("Bridge survey", "", ProposalType::LocalState),
            now,
        );
        let status = &proposal.validation_status;
        assert!(!status.is_valid);
        assert!(status.errors.iter().any(|e| e.contains("due date")));
        assert!(status.warnings.iter().any(|w| w.contains("agency")));
    }
}
