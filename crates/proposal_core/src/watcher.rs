//! Periodic reminder check for custom calendar events.
//!
//! # Responsibility
//! - Fire one notification per custom event whose reminder time falls
//!   within the window around "now".
//! - Remember fired reminders in the persistence gateway so restarts and
//!   overlapping ticks do not repeat them.
//!
//! # Invariants
//! - A reminder is marked only after it was actually shown.
//! - A reminder fires at most once per watcher, even when the durable mark
//!   cannot be written.
//! - The periodic task stops when its `WatcherHandle` is stopped or dropped;
//!   no timer outlives its owner.

use crate::clock::Clock;
use crate::gateway::notify::{Notification, NotificationBackend, Notifier};
use crate::gateway::storage::{KeyValueBackend, PersistenceGateway};
use crate::model::calendar::CustomEvent;
use crate::util::format::format_date_time;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Shortest tick `spawn` accepts; tokio rejects a zero period.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Storage key of the "already notified" flag for one event.
pub fn notification_key(event_id: Uuid) -> String {
    format!("notified_{event_id}")
}

pub struct NotificationWatcher<B: KeyValueBackend, N: NotificationBackend> {
    store: Arc<PersistenceGateway<B>>,
    notifier: Arc<Notifier<N>>,
    window: chrono::Duration,
    fired: Mutex<HashSet<Uuid>>,
}

impl<B, N> NotificationWatcher<B, N>
where
    B: KeyValueBackend + 'static,
    N: NotificationBackend + 'static,
{
    pub fn new(
        store: Arc<PersistenceGateway<B>>,
        notifier: Arc<Notifier<N>>,
        window: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            window: chrono::Duration::from_std(window).unwrap_or(chrono::Duration::seconds(60)),
            fired: Mutex::default(),
        }
    }

    /// Runs one check and returns the ids of events notified now.
    pub fn check(&self, events: &[CustomEvent], now: DateTime<Utc>) -> Vec<Uuid> {
        let mut fired = Vec::new();

        for event in events {
            let Some(settings) = event.notification.as_ref() else {
                continue;
            };
            if !settings.push || settings.sent {
                continue;
            }
            if settings.time < now - self.window || settings.time > now + self.window {
                continue;
            }

            if self.fired_ids().contains(&event.id) {
                continue;
            }
            let key = notification_key(event.id);
            if self.store.contains(&key) {
                continue;
            }

            let notification = Notification {
                title: if event.title.trim().is_empty() {
                    "Calendar reminder".to_string()
                } else {
                    event.title.clone()
                },
                body: event.date.map_or_else(
                    || "Reminder".to_string(),
                    |date| format!("Scheduled for {}", format_date_time(date)),
                ),
                tag: event.id.to_string(),
            };
            if !self.notifier.show(&notification) {
                continue;
            }

            self.fired_ids().insert(event.id);
            if !self.store.set(&key, &now) {
                warn!(
                    "event=notification_mark module=watcher status=error event_id={}",
                    event.id
                );
            }
            fired.push(event.id);
        }

        if !fired.is_empty() {
            info!(
                "event=notification_check module=watcher status=ok fired={}",
                fired.len()
            );
        }
        fired
    }

    /// Starts checking every `interval` on the current tokio runtime.
    ///
    /// The first check runs immediately. `source` is asked for the current
    /// custom events on every tick. Intervals below [`MIN_CHECK_INTERVAL`]
    /// are raised to it.
    pub fn spawn<F>(
        self: Arc<Self>,
        source: F,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> WatcherHandle
    where
        F: Fn() -> Vec<CustomEvent> + Send + Sync + 'static,
    {
        let interval = interval.max(MIN_CHECK_INTERVAL);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let events = source();
                self.check(&events, clock.now());
            }
        });
        debug!(
            "event=watcher_start module=watcher status=ok interval_ms={}",
            interval.as_millis()
        );
        WatcherHandle { task: Some(task) }
    }

    fn fired_ids(&self) -> MutexGuard<'_, HashSet<Uuid>> {
        self.fired.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of a running watcher task; stops it on drop.
pub struct WatcherHandle {
    task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn stop(mut self) {
        self.abort();
    }

    fn abort(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("event=watcher_stop module=watcher status=ok");
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.abort();
    }
}
