//! Domain model for proposals, their tasks, files and calendar entries.
//!
//! # Responsibility
//! - Define canonical data structures used by engines and services.
//! - Keep ownership explicit: proposals own tasks and files; calendar
//!   records only reference them by id.
//!
//! # Invariants
//! - Every entity is identified by a stable `Uuid`.
//! - Deserialization re-checks aggregate invariants.

pub mod calendar;
pub mod file;
pub mod proposal;
pub mod task;
