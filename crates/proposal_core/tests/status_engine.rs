use proptest::prelude::*;
use proposal_core::engine::status::{
    border_color, color, display_name, next, order, previous, UNKNOWN_RANK,
};
use proposal_core::ProposalStatus;

#[test]
fn ranks_follow_lifecycle_order() {
    let labels = [
        "intake",
        "outline",
        "drafting",
        "internal_review",
        "final_review",
        "submitted",
    ];
    for (rank, label) in labels.iter().enumerate() {
        assert_eq!(usize::from(order(label)), rank, "rank of {label}");
    }
}

#[test]
fn next_is_order_consistent_for_every_stage() {
    for status in ProposalStatus::ALL {
        if let Some(following) = status.next() {
            assert_eq!(following.rank(), status.rank() + 1);
            assert_eq!(following.previous(), Some(status));
        }
    }
}

#[test]
fn boundaries_have_no_neighbour() {
    assert_eq!(next("submitted"), None);
    assert_eq!(previous("intake"), None);
    assert_eq!(ProposalStatus::Submitted.next(), None);
    assert_eq!(ProposalStatus::Intake.previous(), None);
}

#[test]
fn unknown_labels_never_fail() {
    assert_eq!(order("on_hold"), UNKNOWN_RANK);
    assert_eq!(next("on_hold"), None);
    assert_eq!(previous("on_hold"), None);
    assert_eq!(display_name("on_hold"), "Unknown");
    assert_eq!(color("on_hold"), "gray");
    assert_eq!(border_color("on_hold"), "gray-300");
}

#[test]
fn display_metadata_comes_from_lookup_tables() {
    assert_eq!(display_name("internal_review"), "Internal Review");
    assert_eq!(color("submitted"), "green");
    assert_eq!(next("Final Review"), Some(ProposalStatus::Submitted));
}

#[test]
fn status_serializes_as_snake_case_label() {
    let json = serde_json::to_value(ProposalStatus::InternalReview).unwrap();
    assert_eq!(json, "internal_review");
    let err = serde_json::from_value::<ProposalStatus>(serde_json::json!("archived"));
    assert!(err.is_err());
}

proptest! {
    #[test]
    fn next_and_previous_agree_with_rank(rank in 0u8..6) {
        let stage = ProposalStatus::from_rank(rank).unwrap();
        if let Some(next) = stage.next() {
            prop_assert_eq!(next.rank(), rank + 1);
            prop_assert_eq!(next.previous(), Some(stage));
        } else {
            prop_assert_eq!(stage, ProposalStatus::Submitted);
        }
        prop_assert_eq!(order(stage.as_str()), rank);
        prop_assert_eq!(ProposalStatus::parse(stage.display_name()), Some(stage));
    }
}
