//! Due-date urgency classification.
//!
//! # Responsibility
//! - Map a due date and an injected "now" onto a coarse urgency tier.
//!
//! # Invariants
//! - Thresholds are evaluated in order (`< 0`, `<= 2`, `<= 7`, `<= 14`),
//!   upper bounds inclusive.
//! - A missing due date classifies as `Low`.
//! - Farther due dates never classify as more urgent than closer ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

pub const CRITICAL_WITHIN_DAYS: i64 = 2;
pub const HIGH_WITHIN_DAYS: i64 = 7;
pub const MEDIUM_WITHIN_DAYS: i64 = 14;

/// Coarse time-pressure tier, most urgent first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyTier {
    /// Only produced by [`classify_with_overdue`].
    Overdue,
    Critical,
    High,
    Medium,
    #[default]
    Low,
}

impl UrgencyTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Higher means more urgent.
    pub fn severity(self) -> u8 {
        match self {
            Self::Overdue => 4,
            Self::Critical => 3,
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => 0,
        }
    }
}

/// Whole days until `due`, rounded up (`ceil`).
///
/// Anything due later today counts as `0`; anything up to one day ago
/// also rounds up to `0`.
pub fn days_until_due(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (due - now).num_milliseconds();
    let whole = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        whole
    } else {
        whole + 1
    }
}

/// Classifies onto {critical, high, medium, low}; past due is `Critical`.
pub fn classify(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> UrgencyTier {
    match due {
        Some(due) => tier_for_days(days_until_due(due, now), false),
        None => UrgencyTier::Low,
    }
}

/// Same thresholds, but past due reports `Overdue` instead of `Critical`.
pub fn classify_with_overdue(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> UrgencyTier {
    match due {
        Some(due) => tier_for_days(days_until_due(due, now), true),
        None => UrgencyTier::Low,
    }
}

/// Parses an RFC 3339 due date and classifies it; unparsable input is `Low`.
pub fn classify_label(due: &str, now: DateTime<Utc>) -> UrgencyTier {
    let parsed = DateTime::parse_from_rfc3339(due.trim())
        .ok()
        .map(|value| value.with_timezone(&Utc));
    classify(parsed, now)
}

fn tier_for_days(days: i64, report_overdue: bool) -> UrgencyTier {
    if days < 0 {
        return if report_overdue {
            UrgencyTier::Overdue
        } else {
            UrgencyTier::Critical
        };
    }
    if days <= CRITICAL_WITHIN_DAYS {
        UrgencyTier::Critical
    } else if days <= HIGH_WITHIN_DAYS {
        UrgencyTier::High
    } else if days <= MEDIUM_WITHIN_DAYS {
        UrgencyTier::Medium
    } else {
        UrgencyTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, classify_label, days_until_due, UrgencyTier};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn days_until_due_rounds_up() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(days_until_due(now, now), 0);
        assert_eq!(days_until_due(now + Duration::hours(1), now), 1);
        assert_eq!(days_until_due(now + Duration::days(2), now), 2);
        assert_eq!(days_until_due(now - Duration::hours(1), now), 0);
        assert_eq!(days_until_due(now - Duration::hours(25), now), -1);
    }

    #[test]
    fn boundaries_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let at = |days| classify(Some(now + Duration::days(days)), now);
        assert_eq!(at(2), UrgencyTier::Critical);
        assert_eq!(at(3), UrgencyTier::High);
        assert_eq!(at(7), UrgencyTier::High);
        assert_eq!(at(8), UrgencyTier::Medium);
        assert_eq!(at(14), UrgencyTier::Medium);
        assert_eq!(at(15), UrgencyTier::Low);
    }

    #[test]
    fn unparsable_label_is_low() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(classify_label("next tuesday", now), UrgencyTier::Low);
        assert_eq!(
            classify_label("2026-05-02T12:00:00Z", now),
            UrgencyTier::Critical
        );
    }
}
