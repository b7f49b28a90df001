//! Celebration scheduling for newly earned achievements
//!
//! A single visible slot plus a FIFO of awards waiting their turn. The scheduler is
//! a pure state machine: it never sleeps. Entering `Showing` yields a
//! [`TimeoutRequest`] and whoever owns the timer reports back through
//! [`NotificationScheduler::on_timeout`] with the request's ticket. Tickets make a
//! late timer harmless after a manual dismissal already moved on.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::events::UnlockedAchievement;

/// How long a celebration stays visible
pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

/// What the presentation layer should currently display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NotificationState {
    Idle,
    Showing {
        achievement: UnlockedAchievement,
        expires_at: DateTime<Utc>,
    },
}

impl NotificationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Id of the achievement on screen, if any
    pub fn showing_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Showing { achievement, .. } => Some(achievement.achievement_id()),
        }
    }
}

/// Ask the timer owner to call back `after` from now with `ticket`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutRequest {
    pub ticket: u64,
    pub after: Duration,
    pub deadline: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Showing {
    item: UnlockedAchievement,
    expires_at: DateTime<Utc>,
    ticket: u64,
}

/// Single-slot celebration queue
#[derive(Debug, Clone)]
pub struct NotificationScheduler {
    duration: Duration,
    current: Option<Showing>,
    queue: VecDeque<UnlockedAchievement>,
    /// Every id that has entered the slot or the queue this session
    seen: HashSet<String>,
    next_ticket: u64,
}

impl Default for NotificationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_DURATION)
    }
}

impl NotificationScheduler {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
            queue: VecDeque::new(),
            seen: HashSet::new(),
            next_ticket: 1,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Queue a celebration. Shows it right away if the slot is free.
    ///
    /// Ids already shown or waiting are dropped.
    pub fn enqueue(
        &mut self,
        item: UnlockedAchievement,
        now: DateTime<Utc>,
    ) -> Option<TimeoutRequest> {
        if !self.seen.insert(item.achievement_id().to_string()) {
            return None;
        }

        if self.current.is_some() {
            self.queue.push_back(item);
            None
        } else {
            Some(self.show(item, now))
        }
    }

    /// Timer fired. Stale tickets are ignored.
    pub fn on_timeout(&mut self, ticket: u64, now: DateTime<Utc>) -> Option<TimeoutRequest> {
        match &self.current {
            Some(showing) if showing.ticket == ticket => self.advance(now),
            _ => None,
        }
    }

    /// Hide the current celebration early; the next queued one takes the slot
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Option<TimeoutRequest> {
        if self.current.is_none() {
            return None;
        }
        self.advance(now)
    }

    /// Drop everything (session teardown). Returns the ticket that was live, if any.
    pub fn clear(&mut self) -> Option<u64> {
        self.queue.clear();
        self.current.take().map(|s| s.ticket)
    }

    pub fn state(&self) -> NotificationState {
        match &self.current {
            None => NotificationState::Idle,
            Some(showing) => NotificationState::Showing {
                achievement: showing.item.clone(),
                expires_at: showing.expires_at,
            },
        }
    }

    /// Awards waiting behind the current one, oldest first
    pub fn pending(&self) -> impl Iterator<Item = &UnlockedAchievement> {
        self.queue.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Ticket of the live timeout, if something is showing
    pub fn live_ticket(&self) -> Option<u64> {
        self.current.as_ref().map(|s| s.ticket)
    }

    fn advance(&mut self, now: DateTime<Utc>) -> Option<TimeoutRequest> {
        self.current = None;
        let next = self.queue.pop_front()?;
        Some(self.show(next, now))
    }

    fn show(&mut self, item: UnlockedAchievement, now: DateTime<Utc>) -> TimeoutRequest {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let delta = TimeDelta::from_std(self.duration).unwrap_or(TimeDelta::MAX);
        let expires_at = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.current = Some(Showing {
            item,
            expires_at,
            ticket,
        });

        TimeoutRequest {
            ticket,
            after: self.duration,
            deadline: expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::catalog::Achievement;

    fn unlocked(id: &str) -> UnlockedAchievement {
        UnlockedAchievement {
            user_id: "u1".into(),
            achievement: Achievement::new(id, id, "", 10, 1.0),
            earned_at: ts(0),
            total_points: 10,
        }
    }

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[test]
    fn test_idle_to_showing() {
        let mut scheduler = NotificationScheduler::default();
        assert!(scheduler.state().is_idle());

        let request = scheduler.enqueue(unlocked("a"), ts(1_000)).unwrap();
        assert_eq!(request.after, Duration::from_millis(5000));
        assert_eq!(request.deadline, ts(6_000));
        assert_eq!(
            scheduler.state(),
            NotificationState::Showing {
                achievement: unlocked("a"),
                expires_at: ts(6_000),
            }
        );
    }

    #[test]
    fn test_second_award_waits_for_timeout() {
        let mut scheduler = NotificationScheduler::default();
        let first = scheduler.enqueue(unlocked("a"), ts(0)).unwrap();
        assert!(scheduler.enqueue(unlocked("b"), ts(0)).is_none());
        assert_eq!(scheduler.state().showing_id(), Some("a"));
        assert_eq!(scheduler.pending_len(), 1);

        let second = scheduler.on_timeout(first.ticket, ts(5_000)).unwrap();
        assert_eq!(scheduler.state().showing_id(), Some("b"));
        assert_eq!(second.deadline, ts(10_000));

        assert!(scheduler.on_timeout(second.ticket, ts(10_000)).is_none());
        assert!(scheduler.state().is_idle());
    }

    #[test]
    fn test_duplicates_are_never_shown_twice() {
        let mut scheduler = NotificationScheduler::default();
        let first = scheduler.enqueue(unlocked("a"), ts(0)).unwrap();
        assert!(scheduler.enqueue(unlocked("a"), ts(1)).is_none());
        assert!(scheduler.enqueue(unlocked("b"), ts(2)).is_none());
        assert!(scheduler.enqueue(unlocked("b"), ts(3)).is_none());
        assert_eq!(scheduler.pending_len(), 1);

        let second = scheduler.on_timeout(first.ticket, ts(5_000)).unwrap();
        scheduler.on_timeout(second.ticket, ts(10_000));
        assert!(scheduler.enqueue(unlocked("a"), ts(11_000)).is_none());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_dismiss_wins_over_late_timer() {
        let mut scheduler = NotificationScheduler::default();
        let first = scheduler.enqueue(unlocked("a"), ts(0)).unwrap();
        scheduler.enqueue(unlocked("b"), ts(0));

        let second = scheduler.dismiss(ts(1_000)).unwrap();
        assert_eq!(scheduler.state().showing_id(), Some("b"));

        // the timer armed for "a" fires late and must not cut "b" short
        assert!(scheduler.on_timeout(first.ticket, ts(5_000)).is_none());
        assert_eq!(scheduler.state().showing_id(), Some("b"));

        assert!(scheduler.on_timeout(second.ticket, ts(6_000)).is_none());
        assert!(scheduler.is_idle());
        assert!(scheduler.dismiss(ts(7_000)).is_none());
    }

    #[test]
    fn test_clear_drops_slot_and_queue() {
        let mut scheduler = NotificationScheduler::default();
        let request = scheduler.enqueue(unlocked("a"), ts(0)).unwrap();
        scheduler.enqueue(unlocked("b"), ts(0));

        assert_eq!(scheduler.clear(), Some(request.ticket));
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.pending_len(), 0);
        assert_eq!(scheduler.clear(), None);
    }
}
