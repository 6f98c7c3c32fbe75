//! User notification capability.
//!
//! # Invariants
//! - `Notifier::show` is a no-op unless permission is `Granted`.
//! - Permission starts as `Default` until explicitly requested.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    #[default]
    Default,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Deduplication tag, usually the source event id.
    pub tag: String,
}

/// Platform side of notifications (desktop, push, test recorder).
pub trait NotificationBackend: Send + Sync {
    fn request_permission(&self) -> NotificationPermission;
    fn display(&self, notification: &Notification);
}

/// Backend that writes notifications to the log; always grants permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationBackend;

impl NotificationBackend for LogNotificationBackend {
    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn display(&self, notification: &Notification) {
        info!(
            "event=notification_shown module=notify status=ok tag={} title_len={}",
            notification.tag,
            notification.title.chars().count()
        );
    }
}

/// Permission-gated notifier.
pub struct Notifier<B: NotificationBackend> {
    backend: B,
    permission: Mutex<NotificationPermission>,
}

impl<B: NotificationBackend> Notifier<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            permission: Mutex::new(NotificationPermission::Default),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
            .lock()
            .map_or(NotificationPermission::Denied, |permission| *permission)
    }

    /// Asks the backend once and remembers the answer.
    pub fn request_permission(&self) -> NotificationPermission {
        let answer = self.backend.request_permission();
        if let Ok(mut permission) = self.permission.lock() {
            *permission = answer;
        }
        answer
    }

    /// Shows `notification` when permitted; returns whether it was shown.
    pub fn show(&self, notification: &Notification) -> bool {
        if self.permission() != NotificationPermission::Granted {
            debug!(
                "event=notification_skipped module=notify status=ok tag={} reason=permission",
                notification.tag
            );
            return false;
        }
        self.backend.display(notification);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{LogNotificationBackend, Notification, NotificationPermission, Notifier};

    fn sample() -> Notification {
        Notification {
            title: "Kickoff".to_string(),
            body: "in 5 minutes".to_string(),
            tag: "evt-1".to_string(),
        }
    }

    #[test]
    fn show_is_noop_until_granted() {
        let notifier = Notifier::new(LogNotificationBackend);
        assert_eq!(notifier.permission(), NotificationPermission::Default);
        assert!(!notifier.show(&sample()));

        assert_eq!(
            notifier.request_permission(),
            NotificationPermission::Granted
        );
        assert!(notifier.show(&sample()));
    }
}
