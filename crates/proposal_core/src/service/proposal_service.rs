//! Proposal workspace use-case service.
//!
//! # Responsibility
//! - Own the in-memory domain graph (proposals with their tasks and files,
//!   plus stored custom events).
//! - Route every mutation through model validation and the status engine.
//! - Persist the graph through the persistence gateway after each mutation.
//!
//! # Invariants
//! - Deleting a proposal removes its tasks and files with it; custom events
//!   that referenced it are kept but detached.
//! - Status moves are single-step (`status::can_transition`).
//! - A proposal whose form validation has errors is never stored.
//! - Stored records that fail to decode are written back verbatim; a list
//!   that cannot be read at all is never overwritten.
//! - Proposals and custom events are saved in one atomic batch.

use crate::clock::Clock;
use crate::engine::projector::{self, Projection};
use crate::engine::status::{self, ProposalStatus};
use crate::gateway::queue::QueueJob;
use crate::gateway::storage::{KeyValueBackend, PersistenceGateway, WriteBatch};
use crate::model::calendar::CustomEvent;
use crate::model::file::FileMeta;
use crate::model::proposal::{
    Proposal, ProposalDraft, ProposalId, ProposalMetadata, ProposalValidationError,
};
use crate::model::task::{Task, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub const PROPOSALS_KEY: &str = "proposals";
pub const CUSTOM_EVENTS_KEY: &str = "calendar_events";
pub const ANALYSIS_JOB_TYPE: &str = "proposal_analysis";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("proposal not found: {0}")]
    ProposalNotFound(ProposalId),
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    #[error("file not found: {0}")]
    FileNotFound(Uuid),
    #[error("calendar event not found: {0}")]
    EventNotFound(Uuid),
    #[error("cannot move proposal from {from} to {to}")]
    IllegalTransition {
        from: ProposalStatus,
        to: ProposalStatus,
    },
    #[error("proposal is already at the {0} boundary stage")]
    AtBoundary(ProposalStatus),
    #[error(transparent)]
    Model(#[from] ProposalValidationError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Task form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: i32,
    pub dependencies: Vec<TaskId>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Persisted list as found at load time.
struct StoredList<T> {
    items: Vec<T>,
    /// Raw entries that did not decode; kept so saving never drops them.
    retained: Vec<Value>,
    /// `false` when the stored value was not a list at all.
    writable: bool,
}

impl<T: DeserializeOwned> StoredList<T> {
    fn load<B: KeyValueBackend>(store: &PersistenceGateway<B>, key: &str) -> Self {
        let raw = match store.try_get::<Vec<Value>>(key) {
            Ok(raw) => raw.unwrap_or_default(),
            Err(err) => {
                warn!(
                    "event=workspace_load module=service status=error key={key} action=read_only error={err}"
                );
                return Self {
                    items: Vec::new(),
                    retained: Vec::new(),
                    writable: false,
                };
            }
        };

        let mut items = Vec::with_capacity(raw.len());
        let mut retained = Vec::new();
        for (index, value) in raw.into_iter().enumerate() {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!(
                        "event=workspace_load module=service status=error key={key} index={index} action=retain error={err}"
                    );
                    retained.push(value);
                }
            }
        }
        Self {
            items,
            retained,
            writable: true,
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum StoredEntry<'a, T> {
    Decoded(&'a T),
    Retained(&'a Value),
}

fn stored_entries<'a, T>(items: &'a [T], retained: &'a [Value]) -> Vec<StoredEntry<'a, T>> {
    items
        .iter()
        .map(StoredEntry::Decoded)
        .chain(retained.iter().map(StoredEntry::Retained))
        .collect()
}

pub struct ProposalService<B: KeyValueBackend> {
    store: Arc<PersistenceGateway<B>>,
    clock: Arc<dyn Clock>,
    proposals: Vec<Proposal>,
    custom_events: Vec<CustomEvent>,
    retained_proposals: Vec<Value>,
    retained_events: Vec<Value>,
    /// Keys whose stored value could not be read; never written.
    frozen_keys: Vec<&'static str>,
}

impl<B: KeyValueBackend> ProposalService<B> {
    /// Loads the persisted graph.
    ///
    /// Records that fail to decode are left out of the working set but kept
    /// for the next save. A key whose value is not a list at all starts
    /// empty and is never written by this service instance.
    pub fn load(store: Arc<PersistenceGateway<B>>, clock: Arc<dyn Clock>) -> Self {
        let proposals = StoredList::<Proposal>::load(&store, PROPOSALS_KEY);
        let custom_events = StoredList::<CustomEvent>::load(&store, CUSTOM_EVENTS_KEY);

        let mut frozen_keys = Vec::new();
        if !proposals.writable {
            frozen_keys.push(PROPOSALS_KEY);
        }
        if !custom_events.writable {
            frozen_keys.push(CUSTOM_EVENTS_KEY);
        }

        info!(
            "event=workspace_load module=service status=ok proposals={} custom_events={} retained={} frozen={}",
            proposals.items.len(),
            custom_events.items.len(),
            proposals.retained.len() + custom_events.retained.len(),
            frozen_keys.len()
        );
        Self {
            store,
            clock,
            proposals: proposals.items,
            custom_events: custom_events.items,
            retained_proposals: proposals.retained,
            retained_events: custom_events.retained,
            frozen_keys,
        }
    }

    /// Writes the whole graph in one batch; returns whether every list was
    /// stored.
    pub fn save(&self) -> bool {
        let mut batch = WriteBatch::new();
        if self.is_writable(PROPOSALS_KEY) {
            batch = batch.set(
                PROPOSALS_KEY,
                &stored_entries(&self.proposals, &self.retained_proposals),
            );
        }
        if self.is_writable(CUSTOM_EVENTS_KEY) {
            batch = batch.set(
                CUSTOM_EVENTS_KEY,
                &stored_entries(&self.custom_events, &self.retained_events),
            );
        }
        let committed = batch.is_empty() || self.store.commit(batch);
        committed && self.frozen_keys.is_empty()
    }

    /// Stored records kept verbatim because they failed to decode.
    pub fn unreadable_records(&self) -> usize {
        self.retained_proposals.len() + self.retained_events.len()
    }

    /// Whether any stored list was unreadable and is protected from writes.
    pub fn is_read_only(&self) -> bool {
        !self.frozen_keys.is_empty()
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|proposal| proposal.id == id)
    }

    pub fn custom_events(&self) -> &[CustomEvent] {
        &self.custom_events
    }

    /// Proposals in board order (stage, then due date, then title).
    pub fn board(&self) -> Vec<&Proposal> {
        let mut board: Vec<&Proposal> = self.proposals.iter().collect();
        board.sort_by(|a, b| {
            a.status
                .rank()
                .cmp(&b.status.rank())
                .then_with(|| match (a.due_date, b.due_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
                .then_with(|| a.title.cmp(&b.title))
        });
        board
    }

    pub fn create_proposal(&mut self, draft: ProposalDraft) -> ServiceResult<Proposal> {
        let proposal = Proposal::new(draft, self.clock.now());
        if !proposal.validation_status.is_valid {
            warn!(
                "event=proposal_create module=service status=error errors={}",
                proposal.validation_status.errors.len()
            );
            return Err(ServiceError::Validation(
                proposal.validation_status.errors.clone(),
            ));
        }

        info!(
            "event=proposal_create module=service status=ok proposal_id={}",
            proposal.id
        );
        self.proposals.push(proposal.clone());
        self.persist();
        Ok(proposal)
    }

    /// Replaces the form fields of an existing proposal.
    ///
    /// Nothing changes when the edited proposal fails validation.
    pub fn update_proposal(
        &mut self,
        id: ProposalId,
        draft: ProposalDraft,
    ) -> ServiceResult<Proposal> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(id)?;

        let mut edited = proposal.clone();
        edited.title = draft.title;
        edited.agency = draft.agency;
        edited.kind = draft.kind;
        edited.due_date = draft.due_date;
        edited.notes = draft.notes;
        edited.refresh_urgency(now);
        if !edited.refresh_validation(now).is_valid {
            return Err(ServiceError::Validation(
                edited.validation_status.errors.clone(),
            ));
        }
        edited.touch(now);

        *proposal = edited.clone();
        self.persist();
        Ok(edited)
    }

    /// Replaces planning metadata; urgency stays derived from the due date.
    pub fn update_metadata(
        &mut self,
        id: ProposalId,
        metadata: ProposalMetadata,
    ) -> ServiceResult<Proposal> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(id)?;
        proposal.metadata = metadata;
        proposal.refresh_urgency(now);
        proposal.touch(now);
        let updated = proposal.clone();
        self.persist();
        Ok(updated)
    }

    /// Moves a proposal one stage; returns the stage it left.
    pub fn move_status(
        &mut self,
        id: ProposalId,
        to: ProposalStatus,
    ) -> ServiceResult<ProposalStatus> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(id)?;
        let from = proposal.status;
        if !status::can_transition(from, to) {
            return Err(ServiceError::IllegalTransition { from, to });
        }

        proposal.status = to;
        proposal.refresh_validation(now);
        proposal.touch(now);
        info!(
            "event=proposal_status module=service status=ok proposal_id={} from={} to={}",
            id, from, to
        );
        self.persist();
        Ok(from)
    }

    pub fn advance_status(&mut self, id: ProposalId) -> ServiceResult<ProposalStatus> {
        let current = self.require_proposal(id)?.status;
        let next = current.next().ok_or(ServiceError::AtBoundary(current))?;
        self.move_status(id, next)?;
        Ok(next)
    }

    pub fn revert_status(&mut self, id: ProposalId) -> ServiceResult<ProposalStatus> {
        let current = self.require_proposal(id)?.status;
        let previous = current.previous().ok_or(ServiceError::AtBoundary(current))?;
        self.move_status(id, previous)?;
        Ok(previous)
    }

    /// Deletes a proposal together with everything it owns.
    pub fn delete_proposal(&mut self, id: ProposalId) -> ServiceResult<Proposal> {
        let index = self
            .proposals
            .iter()
            .position(|proposal| proposal.id == id)
            .ok_or(ServiceError::ProposalNotFound(id))?;
        let removed = self.proposals.remove(index);

        for event in &mut self.custom_events {
            if event.proposal_id == Some(id) {
                event.proposal_id = None;
                event.task_id = None;
            }
        }

        info!(
            "event=proposal_delete module=service status=ok proposal_id={} tasks={} files={}",
            id,
            removed.tasks.len(),
            removed.files.len()
        );
        self.persist();
        Ok(removed)
    }

    pub fn add_task(&mut self, proposal_id: ProposalId, input: NewTask) -> ServiceResult<Task> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(proposal_id)?;

        let mut task = Task::new(proposal_id, input.title, now);
        task.description = input.description;
        task.owner = input.owner;
        task.due_date = input.due_date;
        task.priority = input.priority;
        task.dependencies = input.dependencies;
        if let Some(unknown) = task
            .dependencies
            .iter()
            .find(|dependency| proposal.task(**dependency).is_none())
        {
            return Err(ServiceError::TaskNotFound(*unknown));
        }

        proposal.add_task(task.clone())?;
        proposal.refresh_validation(now);
        proposal.touch(now);
        self.persist();
        Ok(task)
    }

    pub fn set_task_progress(
        &mut self,
        proposal_id: ProposalId,
        task_id: TaskId,
        progress: u8,
    ) -> ServiceResult<Task> {
        self.update_task(proposal_id, task_id, |task, now| {
            task.set_progress(progress, now)
        })
    }

    pub fn complete_task(
        &mut self,
        proposal_id: ProposalId,
        task_id: TaskId,
    ) -> ServiceResult<Task> {
        self.update_task(proposal_id, task_id, |task, now| task.complete(now))
    }

    pub fn reopen_task(
        &mut self,
        proposal_id: ProposalId,
        task_id: TaskId,
    ) -> ServiceResult<Task> {
        self.update_task(proposal_id, task_id, |task, now| task.reopen(now))
    }

    pub fn remove_task(
        &mut self,
        proposal_id: ProposalId,
        task_id: TaskId,
    ) -> ServiceResult<Task> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(proposal_id)?;
        let removed = proposal
            .remove_task(task_id)
            .ok_or(ServiceError::TaskNotFound(task_id))?;
        proposal.refresh_validation(now);
        proposal.touch(now);

        for event in &mut self.custom_events {
            if event.task_id == Some(task_id) {
                event.task_id = None;
            }
        }
        self.persist();
        Ok(removed)
    }

    /// Validates and attaches an uploaded file.
    pub fn attach_file(
        &mut self,
        proposal_id: ProposalId,
        mut file: FileMeta,
    ) -> ServiceResult<FileMeta> {
        let now = self.clock.now();
        let validation = file.validate().clone();
        if !validation.is_valid {
            return Err(ServiceError::Validation(validation.errors));
        }

        let proposal = self.proposal_mut(proposal_id)?;
        proposal.files.push(file.clone());
        proposal.touch(now);
        self.persist();
        Ok(file)
    }

    pub fn remove_file(
        &mut self,
        proposal_id: ProposalId,
        file_id: Uuid,
    ) -> ServiceResult<FileMeta> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(proposal_id)?;
        let index = proposal
            .files
            .iter()
            .position(|file| file.id == file_id)
            .ok_or(ServiceError::FileNotFound(file_id))?;
        let removed = proposal.files.remove(index);
        proposal.touch(now);
        self.persist();
        Ok(removed)
    }

    /// Stores a user-authored calendar entry; title and date are required.
    pub fn add_custom_event(&mut self, event: CustomEvent) -> ServiceResult<Uuid> {
        let missing = event.missing_fields();
        if !missing.is_empty() {
            return Err(ServiceError::Validation(
                missing
                    .into_iter()
                    .map(|field| format!("{field} is required"))
                    .collect(),
            ));
        }
        if let Some(proposal_id) = event.proposal_id {
            self.require_proposal(proposal_id)?;
        }

        let id = event.id;
        self.custom_events.push(event);
        self.persist();
        Ok(id)
    }

    pub fn remove_custom_event(&mut self, id: Uuid) -> ServiceResult<CustomEvent> {
        let index = self
            .custom_events
            .iter()
            .position(|event| event.id == id)
            .ok_or(ServiceError::EventNotFound(id))?;
        let removed = self.custom_events.remove(index);
        self.persist();
        Ok(removed)
    }

    /// Flags reminders reported by the watcher as sent.
    pub fn mark_notifications_sent(&mut self, ids: &[Uuid]) -> usize {
        let mut marked = 0;
        for event in &mut self.custom_events {
            if !ids.contains(&event.id) {
                continue;
            }
            if let Some(settings) = event.notification.as_mut().filter(|s| !s.sent) {
                settings.sent = true;
                marked += 1;
            }
        }
        if marked > 0 {
            self.persist();
        }
        marked
    }

    pub fn calendar(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Projection {
        projector::project_for_range(&self.proposals, &self.custom_events, start, end)
    }

    pub fn calendar_for_day(&self, day: NaiveDate) -> Projection {
        projector::project_for_day(&self.proposals, &self.custom_events, day)
    }

    /// Recomputes urgency for every proposal; returns how many changed.
    pub fn refresh_urgency(&mut self) -> usize {
        let now = self.clock.now();
        let mut changed = 0;
        for proposal in &mut self.proposals {
            let before = proposal.metadata.urgency;
            if proposal.refresh_urgency(now) != before {
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist();
        }
        changed
    }

    /// Builds the document-analysis job for one proposal.
    pub fn analysis_job(&self, id: ProposalId) -> ServiceResult<QueueJob> {
        let proposal = self.require_proposal(id)?;
        let payload = json!({
            "proposalId": proposal.id,
            "title": proposal.title,
            "agency": proposal.agency,
            "status": proposal.status,
            "dueDate": proposal.due_date,
            "files": proposal
                .files
                .iter()
                .map(|file| {
                    json!({
                        "id": file.id,
                        "filename": file.filename,
                        "mimeType": file.mime_type,
                        "content": file.content,
                    })
                })
                .collect::<Vec<_>>(),
        });
        Ok(QueueJob::new(ANALYSIS_JOB_TYPE, payload, self.clock.now()))
    }

    fn update_task(
        &mut self,
        proposal_id: ProposalId,
        task_id: TaskId,
        apply: impl FnOnce(&mut Task, DateTime<Utc>),
    ) -> ServiceResult<Task> {
        let now = self.clock.now();
        let proposal = self.proposal_mut(proposal_id)?;
        let task = proposal
            .task_mut(task_id)
            .ok_or(ServiceError::TaskNotFound(task_id))?;
        apply(task, now);
        let updated = task.clone();
        proposal.touch(now);
        self.persist();
        Ok(updated)
    }

    fn is_writable(&self, key: &str) -> bool {
        !self.frozen_keys.iter().any(|frozen| *frozen == key)
    }

    fn require_proposal(&self, id: ProposalId) -> ServiceResult<&Proposal> {
        self.proposal(id).ok_or(ServiceError::ProposalNotFound(id))
    }

    fn proposal_mut(&mut self, id: ProposalId) -> ServiceResult<&mut Proposal> {
        self.proposals
            .iter_mut()
            .find(|proposal| proposal.id == id)
            .ok_or(ServiceError::ProposalNotFound(id))
    }

    fn persist(&self) {
        if !self.save() {
            warn!("event=workspace_save module=service status=error");
        }
    }
}
