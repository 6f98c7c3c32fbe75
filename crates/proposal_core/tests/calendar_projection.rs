use chrono::{DateTime, TimeZone, Utc};
use proposal_core::engine::projector::{proposal_event_key, task_event_key};
use proposal_core::{
    project_for_range, CustomEvent, EventKind, EventSource, Proposal, ProposalDraft,
    ProposalType, Task,
};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, d, 12, 0, 0).unwrap()
}

fn proposal_due(title: &str, due: DateTime<Utc>) -> Proposal {
    Proposal::new(
        ProposalDraft::new(title, "GSA", ProposalType::Federal).due(due),
        day(1),
    )
}

#[test]
fn merges_all_sources_in_display_order() {
    let mut proposal = proposal_due("Zeta bid", day(10));
    let task = Task::new(proposal.id, "Alpha review", day(1)).with_due_date(day(10));
    let task_id = task.id;
    proposal.add_task(task).unwrap();
    let custom = CustomEvent::new("Aardvark sync", day(10));
    let early = CustomEvent::new("Kickoff", day(5)).with_kind(EventKind::Meeting);

    let projection = project_for_range(
        &[proposal.clone()],
        &[custom.clone(), early.clone()],
        day(1),
        day(30),
    );

    let keys: Vec<_> = projection.events.iter().map(|e| e.key.clone()).collect();
    assert_eq!(
        keys,
        vec![
            early.id.to_string(),
            proposal_event_key(proposal.id),
            task_event_key(task_id),
            custom.id.to_string(),
        ]
    );
    assert!(projection.warnings.is_empty());
    assert_eq!(
        projection.events[2].source,
        EventSource::Derived {
            proposal_id: proposal.id,
            task_id: Some(task_id),
        }
    );
    assert!(projection.events[3].is_stored());
}

#[test]
fn same_day_same_kind_sorts_by_title() {
    let proposals = vec![proposal_due("Beta", day(3)), proposal_due("Alpha", day(3))];
    let projection = project_for_range(&proposals, &[], day(1), day(30));
    let titles: Vec<_> = projection.events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
}

#[test]
fn projection_is_deterministic() {
    let mut proposal = proposal_due("Harbor dredging", day(12));
    for n in 0..5 {
        let task = Task::new(proposal.id, format!("task {n}"), day(1)).with_due_date(day(12));
        proposal.add_task(task).unwrap();
    }
    let events = vec![
        CustomEvent::new("same title", day(12)),
        CustomEvent::new("same title", day(12)),
    ];

    let first = project_for_range(&[proposal.clone()], &events, day(1), day(30));
    let second = project_for_range(&[proposal], &events, day(1), day(30));
    assert_eq!(first, second);
}

#[test]
fn excludes_events_outside_range() {
    let proposals = vec![proposal_due("In range", day(10)), proposal_due("Late", day(25))];
    let projection = project_for_range(&proposals, &[], day(10), day(20));
    assert_eq!(projection.events.len(), 1);
    assert_eq!(projection.events[0].title, "In range");
}

#[test]
fn malformed_custom_events_are_excluded_with_one_warning_each() {
    let untitled = CustomEvent::new("   ", day(4));
    let mut undated = CustomEvent::new("No date", day(4));
    undated.date = None;
    let valid = CustomEvent::new("Valid", day(4));

    let projection = project_for_range(
        &[],
        &[untitled.clone(), undated.clone(), valid.clone()],
        day(1),
        day(30),
    );

    assert_eq!(projection.events.len(), 1);
    assert_eq!(projection.events[0].key, valid.id.to_string());
    assert_eq!(projection.warnings.len(), 2);
    assert_eq!(projection.warnings[0].event_id, untitled.id);
    assert!(projection.warnings[0].message.contains(&untitled.id.to_string()));
    assert!(projection.warnings[0].message.contains("title"));
    assert_eq!(projection.warnings[1].event_id, undated.id);
    assert!(projection.warnings[1].message.contains("date"));
}

#[test]
fn derived_status_reflects_task_and_proposal_progress() {
    let mut proposal = proposal_due("Water treatment", day(20));
    let mut done = Task::new(proposal.id, "done", day(1)).with_due_date(day(15));
    done.complete(day(2));
    let open = Task::new(proposal.id, "open", day(1)).with_due_date(day(16));
    proposal.add_task(done).unwrap();
    proposal.add_task(open).unwrap();

    let projection = project_for_range(&[proposal], &[], day(1), day(30));
    let by_title = |title: &str| {
        projection
            .events
            .iter()
            .find(|event| event.title == title)
            .unwrap()
            .clone()
    };

    assert!(by_title("done").status.completed);
    assert_eq!(by_title("open").status.progress, 0);
    let proposal_event = by_title("Water treatment");
    assert_eq!(proposal_event.status.progress, 50);
    assert!(!proposal_event.status.completed);
    assert_eq!(proposal_event.date, day(20));
}

#[test]
fn untitled_proposals_and_tasks_are_excluded_with_a_warning() {
    let mut proposal = proposal_due("   ", day(12));
    let task = Task::new(proposal.id, "", day(1)).with_due_date(day(13));
    let task_id = task.id;
    proposal.tasks.push(task);

    let projection = project_for_range(&[proposal.clone()], &[], day(1), day(30));

    assert!(projection.events.is_empty());
    let ids: Vec<_> = projection.warnings.iter().map(|w| w.event_id).collect();
    assert_eq!(ids, vec![proposal.id, task_id]);
    assert!(projection.warnings[0].message.starts_with("proposal"));
    assert!(projection.warnings[1].message.contains("title"));
}

#[test]
fn linked_custom_event_keeps_its_proposal_and_reminder() {
    let proposal = proposal_due("Grid modernization", day(20));
    let mut review = CustomEvent::new("Red team review", day(15))
        .with_kind(EventKind::Meeting)
        .with_notification(day(14), true);
    review.proposal_id = Some(proposal.id);

    let projection = project_for_range(&[proposal.clone()], &[review.clone()], day(1), day(30));
    let projected = projection
        .events
        .iter()
        .find(|event| event.key == review.id.to_string())
        .unwrap();

    assert!(projected.is_stored());
    assert_eq!(projected.proposal_id(), Some(proposal.id));
    assert_eq!(projected.task_id(), None);
    assert_eq!(projected.notification, review.notification);
    assert!(matches!(
        projected.source,
        EventSource::Stored { event_id, .. } if event_id == review.id
    ));
}
