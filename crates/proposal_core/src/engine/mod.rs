//! Pure derivation engines.
//!
//! # Responsibility
//! - Status ordering/display, urgency tiers and calendar projection.
//!
//! # Invariants
//! - No engine function performs I/O or reads the system clock.
//! - No engine function fails; bad input degrades to a documented default.

pub mod projector;
pub mod status;
pub mod urgency;
