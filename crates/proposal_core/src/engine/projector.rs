//! Calendar projection over proposals, tasks and custom events.
//!
//! # Responsibility
//! - Merge stored custom events with events derived from proposal and task
//!   due dates into one display-ordered list.
//! - Report events that cannot be displayed (no title, or a custom event
//!   without a date) as warnings.
//!
//! # Invariants
//! - Pure: output depends only on the arguments.
//! - Ordering is total: date, kind priority, title, key.
//! - The range is inclusive on both ends; an inverted range is empty.

use crate::model::calendar::{CalendarEvent, CustomEvent, EventKind, EventSource, EventStatus};
use crate::model::proposal::Proposal;
use crate::model::task::Task;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

/// Event that was excluded from a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionWarning {
    /// Custom event id, or the proposal/task id of a derived event.
    pub event_id: Uuid,
    pub message: String,
}

/// Projection result envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Sorted by date, kind priority, title, key.
    pub events: Vec<CalendarEvent>,
    /// One entry per excluded event: every malformed custom event, plus
    /// untitled proposals/tasks due within the range.
    pub warnings: Vec<ProjectionWarning>,
}

/// Derivation key of a proposal's due-date event.
pub fn proposal_event_key(proposal_id: Uuid) -> String {
    format!("proposal_{proposal_id}")
}

/// Derivation key of a task's due-date event.
pub fn task_event_key(task_id: Uuid) -> String {
    format!("task_{task_id}")
}

/// Projects every event whose date lies in `start..=end`.
pub fn project_for_range(
    proposals: &[Proposal],
    custom_events: &[CustomEvent],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Projection {
    let in_range = |date: DateTime<Utc>| start <= date && date <= end;
    let mut events = Vec::new();
    let mut warnings = Vec::new();

    for proposal in proposals {
        if let Some(due) = proposal.due_date.filter(|due| in_range(*due)) {
            if is_blank(&proposal.title) {
                warnings.push(untitled_warning("proposal", proposal.id));
            } else {
                events.push(derive_proposal_event(proposal, due));
            }
        }
        for task in &proposal.tasks {
            if let Some(due) = task.due_date.filter(|due| in_range(*due)) {
                if is_blank(&task.title) {
                    warnings.push(untitled_warning("task", task.id));
                } else {
                    events.push(derive_task_event(task, due));
                }
            }
        }
    }

    for event in custom_events {
        let missing = event.missing_fields();
        if !missing.is_empty() {
            warnings.push(ProjectionWarning {
                event_id: event.id,
                message: format!("event {} is missing {}", event.id, missing.join(" and ")),
            });
            continue;
        }
        if let Some(date) = event.date.filter(|date| in_range(*date)) {
            events.push(stored_event(event, date));
        }
    }

    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.kind.display_priority().cmp(&b.kind.display_priority()))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.key.cmp(&b.key))
    });

    Projection { events, warnings }
}

/// Projects one UTC calendar day.
pub fn project_for_day(
    proposals: &[Proposal],
    custom_events: &[CustomEvent],
    day: NaiveDate,
) -> Projection {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1) - Duration::milliseconds(1);
    project_for_range(proposals, custom_events, start, end)
}

fn is_blank(title: &str) -> bool {
    title.trim().is_empty()
}

fn untitled_warning(owner: &str, id: Uuid) -> ProjectionWarning {
    ProjectionWarning {
        event_id: id,
        message: format!("{owner} {id} is missing title"),
    }
}

fn derive_proposal_event(proposal: &Proposal, due: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        key: proposal_event_key(proposal.id),
        title: proposal.title.clone(),
        date: due,
        kind: EventKind::Proposal,
        source: EventSource::Derived {
            proposal_id: proposal.id,
            task_id: None,
        },
        status: EventStatus {
            completed: proposal.status.is_terminal(),
            progress: proposal.progress_percent(),
        },
        notification: None,
    }
}

fn derive_task_event(task: &Task, due: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        key: task_event_key(task.id),
        title: task.title.clone(),
        date: due,
        kind: EventKind::Task,
        source: EventSource::Derived {
            proposal_id: task.proposal_id,
            task_id: Some(task.id),
        },
        status: EventStatus {
            completed: task.completed,
            progress: task.status.progress,
        },
        notification: None,
    }
}

fn stored_event(event: &CustomEvent, date: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        key: event.id.to_string(),
        title: event.title.clone(),
        date,
        kind: event.kind,
        source: EventSource::Stored {
            event_id: event.id,
            proposal_id: event.proposal_id,
            task_id: event.task_id,
        },
        status: event.status,
        notification: event.notification.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{project_for_day, project_for_range};
    use crate::model::calendar::{CustomEvent, EventKind};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn inverted_range_is_empty() {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        let events = vec![CustomEvent::new("standup", now)];
        let projection = project_for_range(&[], &events, now + Duration::days(1), now);
        assert!(projection.events.is_empty());
    }

    #[test]
    fn single_day_bounds_are_inclusive() {
        let midnight = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let events = vec![
            CustomEvent::new("early", midnight),
            CustomEvent::new("late", midnight + Duration::days(1) - Duration::seconds(1))
                .with_kind(EventKind::Meeting),
            CustomEvent::new("tomorrow", midnight + Duration::days(1)),
        ];
        let projection = project_for_day(&[], &events, midnight.date_naive());
        let titles: Vec<_> = projection.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }
}
