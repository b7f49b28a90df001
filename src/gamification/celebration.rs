//! Per-session celebration slot
//!
//! Glues the pure [`NotificationScheduler`] to a [`Timer`]: every `TimeoutRequest`
//! becomes a scheduled callback, and the callback feeds the ticket back into the
//! scheduler. Dropping the slot (session teardown) cancels the live timer, and a
//! callback that still slips through finds the slot closed and does nothing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use super::events::UnlockedAchievement;
use super::notifications::{NotificationScheduler, NotificationState, TimeoutRequest};
use super::observers::{NotificationCallback, Observers};
use super::timer::{Timer, TimerHandle};
use crate::clock::Clock;

struct SlotState {
    scheduler: NotificationScheduler,
    armed: Option<Box<dyn TimerHandle>>,
    closed: bool,
}

#[derive(Clone)]
struct SlotShared {
    user_id: Arc<str>,
    state: Arc<Mutex<SlotState>>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    observers: Arc<Observers<NotificationCallback>>,
}

impl SlotShared {
    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.state.lock().expect("celebration lock")
    }

    /// Arm a timer for `request`, replacing any previous one
    fn arm(&self, slot: &mut SlotState, request: TimeoutRequest) {
        let shared = self.clone();
        let ticket = request.ticket;
        let handle = self
            .timer
            .schedule(request.after, Box::new(move || shared.on_timeout(ticket)));

        if let Some(previous) = slot.armed.replace(handle) {
            previous.cancel();
        }
    }

    fn on_timeout(&self, ticket: u64) {
        let state = {
            let mut slot = self.lock();
            if slot.closed || slot.scheduler.live_ticket() != Some(ticket) {
                return;
            }
            // this timer is the one firing; nothing left to cancel
            slot.armed = None;

            if let Some(request) = slot.scheduler.on_timeout(ticket, self.clock.now()) {
                self.arm(&mut slot, request);
            }
            slot.scheduler.state()
        };

        debug!(user_id = %self.user_id, showing = ?state.showing_id(), "Celebration timed out");
        self.observers.publish(&self.user_id, &state);
    }
}

/// Celebration slot owned by one user session
pub(crate) struct CelebrationSlot {
    shared: SlotShared,
}

impl CelebrationSlot {
    pub(crate) fn new(
        user_id: &str,
        duration: Duration,
        timer: Arc<dyn Timer>,
        clock: Arc<dyn Clock>,
        observers: Arc<Observers<NotificationCallback>>,
    ) -> Self {
        Self {
            shared: SlotShared {
                user_id: Arc::from(user_id),
                state: Arc::new(Mutex::new(SlotState {
                    scheduler: NotificationScheduler::new(duration),
                    armed: None,
                    closed: false,
                })),
                timer,
                clock,
                observers,
            },
        }
    }

    /// Queue a celebration; publishes if it went straight on screen
    pub(crate) fn celebrate(&self, unlocked: UnlockedAchievement) {
        let state = {
            let mut slot = self.shared.lock();
            if slot.closed {
                return;
            }
            let Some(request) = slot.scheduler.enqueue(unlocked, self.shared.clock.now()) else {
                return;
            };
            self.shared.arm(&mut slot, request);
            slot.scheduler.state()
        };

        self.shared.observers.publish(&self.shared.user_id, &state);
    }

    /// Hide the current celebration early. Returns false if nothing was showing.
    pub(crate) fn dismiss(&self) -> bool {
        let state = {
            let mut slot = self.shared.lock();
            if slot.closed || slot.scheduler.is_idle() {
                return false;
            }
            if let Some(armed) = slot.armed.take() {
                armed.cancel();
            }
            if let Some(request) = slot.scheduler.dismiss(self.shared.clock.now()) {
                self.shared.arm(&mut slot, request);
            }
            slot.scheduler.state()
        };

        self.shared.observers.publish(&self.shared.user_id, &state);
        true
    }

    pub(crate) fn state(&self) -> NotificationState {
        self.shared.lock().scheduler.state()
    }

    pub(crate) fn pending(&self) -> Vec<UnlockedAchievement> {
        self.shared.lock().scheduler.pending().cloned().collect()
    }

    /// Cancel the live timer and drop queued celebrations
    pub(crate) fn close(&self) {
        let mut slot = self.shared.lock();
        if slot.closed {
            return;
        }
        slot.closed = true;
        if let Some(armed) = slot.armed.take() {
            armed.cancel();
        }
        slot.scheduler.clear();
    }
}

impl Drop for CelebrationSlot {
    fn drop(&mut self) {
        self.close();
    }
}
