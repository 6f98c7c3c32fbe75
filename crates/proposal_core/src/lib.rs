//! Core domain logic for proposal tracking.
//! This crate is the single source of truth for proposal, task and
//! calendar invariants; UI layers consume it through services and gateways.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod service;
pub mod util;
pub mod watcher;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ApiConfig, CoreConfig, QueueConfig, WatcherConfig};
pub use engine::projector::{project_for_day, project_for_range, Projection, ProjectionWarning};
pub use engine::status::{can_transition, ProposalStatus, StatusStyle};
pub use engine::urgency::{classify, classify_with_overdue, days_until_due, UrgencyTier};
pub use gateway::api::{ProposalSummary, ProposalsApi};
pub use gateway::notify::{
    LogNotificationBackend, Notification, NotificationBackend, NotificationPermission, Notifier,
};
pub use gateway::queue::{ConnectivityStatus, QueueClient, QueueJob};
pub use gateway::storage::{
    KeyValueBackend, MemoryStore, PersistenceGateway, SqliteStore, StorageError, WriteBatch,
};
pub use gateway::GatewayError;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::calendar::{
    CalendarEvent, CustomEvent, EventKind, EventSource, EventStatus, NotificationSettings,
};
pub use model::file::{FileMeta, FileValidation};
pub use model::proposal::{
    Proposal, ProposalDraft, ProposalId, ProposalMetadata, ProposalType,
    ProposalValidationError, RiskLevel, ValidationStatus,
};
pub use model::task::{Task, TaskId, TaskProgress, TaskState, TaskValidationError};
pub use service::proposal_service::{NewTask, ProposalService, ServiceError, ServiceResult};
pub use watcher::{NotificationWatcher, WatcherHandle};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
