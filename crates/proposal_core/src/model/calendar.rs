//! Calendar entries: user-authored stored events and projected records.
//!
//! # Responsibility
//! - Define `CustomEvent`, the only calendar shape that is persisted.
//! - Define `CalendarEvent`, the projected record every calendar view reads.
//!
//! # Invariants
//! - Derived events are never persisted; their identity is the derivation
//!   key (`proposal_<id>`, `task_<id>`).
//! - `EventSource` tells stored and derived records apart explicitly.

use crate::util::generate_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Calendar event category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Proposal,
    Task,
    Meeting,
    Deadline,
    Custom,
}

impl EventKind {
    /// Display grouping within one day: proposals, then tasks, then
    /// user-authored entries.
    pub fn display_priority(self) -> u8 {
        match self {
            Self::Proposal => 0,
            Self::Task => 1,
            Self::Deadline => 2,
            Self::Meeting => 3,
            Self::Custom => 4,
        }
    }

    pub fn is_derived(self) -> bool {
        matches!(self, Self::Proposal | Self::Task)
    }
}

/// Completion snapshot carried by a calendar entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStatus {
    pub completed: bool,
    pub progress: u8,
}

/// Reminder settings for a user-authored event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub time: DateTime<Utc>,
    /// Whether a push/desktop notification is wanted at `time`.
    pub push: bool,
    #[serde(default)]
    pub sent: bool,
}

/// User-authored calendar entry, persisted as-is.
///
/// `title` and `date` may be missing on input; such events are kept but
/// excluded from projections with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEvent {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub kind: EventKind,
    pub proposal_id: Option<Uuid>,
    pub task_id: Option<Uuid>,
    #[serde(default)]
    pub status: EventStatus,
    pub notification: Option<NotificationSettings>,
}

impl CustomEvent {
    pub fn new(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            date: Some(date),
            kind: EventKind::Custom,
            proposal_id: None,
            task_id: None,
            status: EventStatus::default(),
            notification: None,
        }
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_notification(mut self, time: DateTime<Utc>, push: bool) -> Self {
        self.notification = Some(NotificationSettings {
            time,
            push,
            sent: false,
        });
        self
    }

    /// Lists why this event cannot be displayed; empty when it can.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        missing
    }
}

/// Where a projected calendar record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum EventSource {
    /// User-authored entry persisted under `event_id`, with its optional
    /// link to a proposal or task.
    Stored {
        event_id: Uuid,
        proposal_id: Option<Uuid>,
        task_id: Option<Uuid>,
    },
    /// Recomputed from proposal (and task) state on every read.
    Derived {
        proposal_id: Uuid,
        task_id: Option<Uuid>,
    },
}

/// Projected, display-ready calendar record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Stable key: stored event id, or `proposal_<id>` / `task_<id>`.
    pub key: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub kind: EventKind,
    pub source: EventSource,
    pub status: EventStatus,
    /// Reminder settings; only stored events carry them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationSettings>,
}

impl CalendarEvent {
    pub fn is_stored(&self) -> bool {
        matches!(self.source, EventSource::Stored { .. })
    }

    /// Proposal this record points at, stored or derived.
    pub fn proposal_id(&self) -> Option<Uuid> {
        match self.source {
            EventSource::Derived { proposal_id, .. } => Some(proposal_id),
            EventSource::Stored { proposal_id, .. } => proposal_id,
        }
    }

    pub fn task_id(&self) -> Option<Uuid> {
        match self.source {
            EventSource::Derived { task_id, .. } | EventSource::Stored { task_id, .. } => task_id,
        }
    }
}
