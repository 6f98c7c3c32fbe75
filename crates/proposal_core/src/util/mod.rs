//! Shared helpers with no domain state.

use uuid::Uuid;

pub mod format;

/// Fresh random identifier for every newly created entity.
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}
