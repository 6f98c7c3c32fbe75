//! External collaborator boundaries.
//!
//! # Responsibility
//! - Wrap storage, HTTP and notification capabilities behind narrow
//!   interfaces so domain code never touches them directly.
//!
//! # Invariants
//! - Network gateways fail with a typed [`GatewayError`] naming the
//!   gateway; callers decide whether to surface or ignore it.
//! - Connectivity checks never fail; they report status instead.

use thiserror::Error;

pub mod api;
pub mod notify;
pub mod queue;
pub mod storage;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("queue endpoint is not configured")]
    NotConfigured,
    #[error("Queue error {status}: {body}")]
    Queue { status: u16, body: String },
    #[error("failed to load {resource} (HTTP {status})")]
    LoadFailed { resource: String, status: u16 },
    #[error("{gateway} request failed: {source}")]
    Transport {
        gateway: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

pub type GatewayResult<T> = Result<T, GatewayError>;
