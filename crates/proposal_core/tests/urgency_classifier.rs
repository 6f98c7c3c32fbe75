use chrono::{DateTime, Duration, TimeZone, Utc};
use proposal_core::engine::urgency::classify_label;
use proposal_core::{classify, classify_with_overdue, UrgencyTier};
use proptest::prelude::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
}

#[test]
fn reference_points_classify_as_expected() {
    let now = now();
    assert_eq!(classify(Some(now - Duration::days(1)), now), UrgencyTier::Critical);
    assert_eq!(classify(Some(now + Duration::days(1)), now), UrgencyTier::Critical);
    assert_eq!(classify(Some(now + Duration::days(5)), now), UrgencyTier::High);
    assert_eq!(classify(Some(now + Duration::days(10)), now), UrgencyTier::Medium);
    assert_eq!(classify(Some(now + Duration::days(30)), now), UrgencyTier::Low);
}

#[test]
fn overdue_variant_only_differs_in_the_past() {
    let now = now();
    assert_eq!(
        classify_with_overdue(Some(now - Duration::days(2)), now),
        UrgencyTier::Overdue
    );
    assert_eq!(
        classify_with_overdue(Some(now + Duration::days(5)), now),
        UrgencyTier::High
    );
}

#[test]
fn missing_or_invalid_due_date_is_low() {
    assert_eq!(classify(None, now()), UrgencyTier::Low);
    assert_eq!(classify_with_overdue(None, now()), UrgencyTier::Low);
    assert_eq!(classify_label("", now()), UrgencyTier::Low);
}

#[test]
fn tier_serializes_as_snake_case() {
    assert_eq!(
        serde_json::to_value(UrgencyTier::Critical).unwrap(),
        "critical"
    );
}

proptest! {
    #[test]
    fn farther_due_dates_are_never_more_urgent(
        a in -40_000_000_i64..40_000_000,
        b in -40_000_000_i64..40_000_000,
    ) {
        let now = now();
        let (near, far) = if a <= b { (a, b) } else { (b, a) };
        let near_tier = classify(Some(now + Duration::seconds(near)), now);
        let far_tier = classify(Some(now + Duration::seconds(far)), now);
        prop_assert!(far_tier.severity() <= near_tier.severity());

        let near_tier = classify_with_overdue(Some(now + Duration::seconds(near)), now);
        let far_tier = classify_with_overdue(Some(now + Duration::seconds(far)), now);
        prop_assert!(far_tier.severity() <= near_tier.severity());
    }
}
