//! In-memory observer registry
//!
//! Callbacks are invoked outside the registry lock, so a callback may subscribe or
//! unsubscribe without deadlocking. Nothing survives a restart.

use std::sync::{Arc, Mutex};

use super::events::GamificationEvent;
use super::notifications::NotificationState;

/// Handle returned by a subscription, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Receives award and level-up events in award order
pub type AwardCallback = dyn Fn(&GamificationEvent) + Send + Sync;

/// Receives `(user_id, state)` whenever a user's celebration slot changes
pub type NotificationCallback = dyn Fn(&str, &NotificationState) + Send + Sync;

pub(crate) struct Observers<F: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Arc<F>)>>,
}

impl<F: ?Sized> Default for Observers<F> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> Observers<F> {
    pub(crate) fn add(&self, id: SubscriptionId, callback: Arc<F>) {
        self.entries.lock().expect("observer lock").push((id, callback));
    }

    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().expect("observer lock");
        let before = entries.len();
        entries.retain(|(sid, _)| *sid != id);
        entries.len() != before
    }

    /// Registration-ordered copy of the callbacks
    pub(crate) fn snapshot(&self) -> Vec<Arc<F>> {
        let entries = self.entries.lock().expect("observer lock");
        entries.iter().map(|(_, cb)| cb.clone()).collect()
    }
}

impl Observers<AwardCallback> {
    pub(crate) fn publish(&self, event: &GamificationEvent) {
        for callback in self.snapshot() {
            callback(event);
        }
    }
}

impl Observers<NotificationCallback> {
    pub(crate) fn publish(&self, user_id: &str, state: &NotificationState) {
        for callback in self.snapshot() {
            callback(user_id, state);
        }
    }
}
