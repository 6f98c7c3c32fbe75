//! Proposal lifecycle stages and transition queries.
//!
//! # Responsibility
//! - Define the total order over the six lifecycle stages.
//! - Provide display metadata lookups for board columns.
//! - Answer next/previous/transition questions for raw labels and enums.
//!
//! # Invariants
//! - Every function here is total: unknown labels degrade to the
//!   "Unknown" presentation or the beyond-terminal rank, never an error.
//! - `rank(next(s)) == rank(s) + 1` whenever `next(s)` exists.

use crate::util::format::to_snake_case;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Rank reported for labels outside the lifecycle.
pub const UNKNOWN_RANK: u8 = 6;

/// Lifecycle stage of a proposal, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Intake,
    Outline,
    Drafting,
    InternalReview,
    FinalReview,
    Submitted,
}

/// Color tokens used to render a status column or badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub color: &'static str,
    pub border_color: &'static str,
}

const UNKNOWN_STYLE: StatusStyle = StatusStyle {
    color: "gray",
    border_color: "gray-300",
};

impl ProposalStatus {
    /// All stages in lifecycle order.
    pub const ALL: [ProposalStatus; 6] = [
        ProposalStatus::Intake,
        ProposalStatus::Outline,
        ProposalStatus::Drafting,
        ProposalStatus::InternalReview,
        ProposalStatus::FinalReview,
        ProposalStatus::Submitted,
    ];

    /// Fixed rank in `0..=5`.
    pub fn rank(self) -> u8 {
        match self {
            Self::Intake => 0,
            Self::Outline => 1,
            Self::Drafting => 2,
            Self::InternalReview => 3,
            Self::FinalReview => 4,
            Self::Submitted => 5,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(usize::from(rank)).copied()
    }

    /// Succeeding stage, or `None` for `Submitted`.
    pub fn next(self) -> Option<Self> {
        Self::from_rank(self.rank() + 1)
    }

    /// Preceding stage, or `None` for `Intake`.
    pub fn previous(self) -> Option<Self> {
        self.rank().checked_sub(1).and_then(Self::from_rank)
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Submitted
    }

    /// Stable wire label (`internal_review`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Outline => "outline",
            Self::Drafting => "drafting",
            Self::InternalReview => "internal_review",
            Self::FinalReview => "final_review",
            Self::Submitted => "submitted",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Intake => "Intake",
            Self::Outline => "Outline",
            Self::Drafting => "Drafting",
            Self::InternalReview => "Internal Review",
            Self::FinalReview => "Final Review",
            Self::Submitted => "Submitted",
        }
    }

    pub fn style(self) -> StatusStyle {
        match self {
            Self::Intake => StatusStyle {
                color: "slate",
                border_color: "slate-400",
            },
            Self::Outline => StatusStyle {
                color: "blue",
                border_color: "blue-400",
            },
            Self::Drafting => StatusStyle {
                color: "indigo",
                border_color: "indigo-400",
            },
            Self::InternalReview => StatusStyle {
                color: "amber",
                border_color: "amber-400",
            },
            Self::FinalReview => StatusStyle {
                color: "orange",
                border_color: "orange-400",
            },
            Self::Submitted => StatusStyle {
                color: "green",
                border_color: "green-500",
            },
        }
    }

    /// Parses a label leniently: display names, dashed, camel and snake
    /// forms all match (`"Internal Review"`, `"final-review"`).
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = to_snake_case(label);
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
    }
}

impl Display for ProposalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rank of a raw label; unknown labels map to [`UNKNOWN_RANK`].
pub fn order(label: &str) -> u8 {
    ProposalStatus::parse(label).map_or(UNKNOWN_RANK, ProposalStatus::rank)
}

/// Next stage of a raw label; `None` for `submitted` or unknown input.
pub fn next(label: &str) -> Option<ProposalStatus> {
    ProposalStatus::parse(label).and_then(ProposalStatus::next)
}

/// Previous stage of a raw label; `None` for `intake` or unknown input.
pub fn previous(label: &str) -> Option<ProposalStatus> {
    ProposalStatus::parse(label).and_then(ProposalStatus::previous)
}

pub fn display_name(label: &str) -> &'static str {
    ProposalStatus::parse(label).map_or("Unknown", ProposalStatus::display_name)
}

pub fn style(label: &str) -> StatusStyle {
    ProposalStatus::parse(label).map_or(UNKNOWN_STYLE, ProposalStatus::style)
}

pub fn color(label: &str) -> &'static str {
    style(label).color
}

pub fn border_color(label: &str) -> &'static str {
    style(label).border_color
}

/// Whether a board move from `from` to `to` is legal.
///
/// Only single-step moves are allowed; staying put is not a transition.
pub fn can_transition(from: ProposalStatus, to: ProposalStatus) -> bool {
    from.next() == Some(to) || from.previous() == Some(to)
}

#[cfg(test)]
mod tests {
    use super::{can_transition, display_name, order, style, ProposalStatus, UNKNOWN_RANK};

    #[test]
    fn parse_accepts_display_and_dashed_forms() {
        assert_eq!(
            ProposalStatus::parse("Internal Review"),
            Some(ProposalStatus::InternalReview)
        );
        assert_eq!(
            ProposalStatus::parse(" final-review "),
            Some(ProposalStatus::FinalReview)
        );
        assert_eq!(
            ProposalStatus::parse("internalReview"),
            Some(ProposalStatus::InternalReview)
        );
        assert_eq!(ProposalStatus::parse("archived"), None);
    }

    #[test]
    fn unknown_label_degrades_to_defaults() {
        assert_eq!(order("archived"), UNKNOWN_RANK);
        assert_eq!(display_name(""), "Unknown");
        assert_eq!(style("???").color, "gray");
    }

    #[test]
    fn transitions_are_single_step() {
        assert!(can_transition(
            ProposalStatus::Drafting,
            ProposalStatus::InternalReview
        ));
        assert!(can_transition(
            ProposalStatus::Drafting,
            ProposalStatus::Outline
        ));
        assert!(!can_transition(
            ProposalStatus::Intake,
            ProposalStatus::Submitted
        ));
        assert!(!can_transition(
            ProposalStatus::Drafting,
            ProposalStatus::Drafting
        ));
    }
}
