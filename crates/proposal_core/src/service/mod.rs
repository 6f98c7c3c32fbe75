//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate model, engine and gateway calls into user-action APIs.
//! - Keep CLI/UI layers decoupled from storage details.

pub mod proposal_service;
