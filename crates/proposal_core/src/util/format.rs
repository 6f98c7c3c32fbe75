//! Small display helpers shared by services and the CLI.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static WORD_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+|([a-z0-9])([A-Z])").expect("valid word split regex"));

/// `Oct 18, 2026`.
pub fn format_date(value: DateTime<Utc>) -> String {
    value.format("%b %-d, %Y").to_string()
}

/// `Oct 18, 2026 14:05 UTC`.
pub fn format_date_time(value: DateTime<Utc>) -> String {
    value.format("%b %-d, %Y %H:%M UTC").to_string()
}

/// Human label for a signed day count (`today`, `in 3 days`, `2 days ago`).
pub fn relative_days(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        -1 => "yesterday".to_string(),
        d if d > 1 => format!("in {d} days"),
        d => format!("{} days ago", -d),
    }
}

/// `internal_review` / `internalReview` / `internal-review` ->
/// `Internal Review`.
pub fn to_title_case(value: &str) -> String {
    split_words(value)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `Internal Review` / `internalReview` -> `internal_review`.
pub fn to_snake_case(value: &str) -> String {
    split_words(value).join("_")
}

fn split_words(value: &str) -> Vec<String> {
    WORD_SPLIT_RE
        .replace_all(value.trim(), "$1 $2")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{format_date, relative_days, to_snake_case, to_title_case};
    use chrono::{TimeZone, Utc};

    #[test]
    fn casing_round_trips_common_shapes() {
        assert_eq!(to_title_case("internal_review"), "Internal Review");
        assert_eq!(to_title_case("finalReview"), "Final Review");
        assert_eq!(to_snake_case("Local State"), "local_state");
        assert_eq!(to_snake_case("dueDate"), "due_date");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn date_and_relative_labels() {
        let value = Utc.with_ymd_and_hms(2026, 10, 8, 9, 30, 0).unwrap();
        assert_eq!(format_date(value), "Oct 8, 2026");
        assert_eq!(relative_days(0), "today");
        assert_eq!(relative_days(5), "in 5 days");
        assert_eq!(relative_days(-3), "3 days ago");
    }
}
