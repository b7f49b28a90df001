//! Achievement engine - the single authority for earning achievements
//!
//! Progress updates land in the user's [`ProgressLedger`]. When a record reaches
//! its ceiling for the first time the engine latches `earned_at`, accrues the
//! achievement's points, announces the award to subscribers and queues a
//! celebration. Everything is passed in explicitly: catalog, store, clock, id
//! generator and timer.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::{Achievement, AchievementCatalog, AchievementCategory};
use super::celebration::CelebrationSlot;
use super::error::EngineError;
use super::events::{GamificationEvent, LevelUp, UnlockedAchievement};
use super::ledger::{ProgressLedger, ProgressRecord, UserGamificationState};
use super::levels::PlayerLevel;
use super::notifications::{DEFAULT_NOTIFICATION_DURATION, NotificationState};
use super::observers::{AwardCallback, NotificationCallback, Observers, SubscriptionId};
use super::share::{ShareSnapshot, ShareSnapshotService};
use super::timer::Timer;
use crate::clock::{Clock, SystemClock};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::store::PersistenceAdapter;

/// Tunables for an engine instance
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Prefix of every storage key
    pub namespace: String,
    /// How long each celebration stays visible
    pub notification_duration: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            namespace: "edvantage".to_string(),
            notification_duration: DEFAULT_NOTIFICATION_DURATION,
        }
    }
}

/// Read-only projection of a user's state with the derived level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStateView {
    pub user_id: String,
    pub points: u64,
    pub level: u64,
    pub points_to_next_level: u64,
    pub level_progress: u64,
    pub records: Vec<ProgressRecord>,
}

impl UserStateView {
    fn new(state: &UserGamificationState) -> Self {
        let level = PlayerLevel::new(state.points);
        Self {
            user_id: state.user_id.clone(),
            points: state.points,
            level: level.level,
            points_to_next_level: level.points_to_next_level,
            level_progress: level.level_progress,
            records: state.records.values().cloned().collect(),
        }
    }
}

/// An earned achievement with its catalog entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarnedAchievement {
    pub achievement: Achievement,
    pub earned_at: DateTime<Utc>,
}

/// A catalog entry paired with the user's record for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementProgress {
    pub achievement: Achievement,
    pub record: ProgressRecord,
}

/// Dashboard totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementSummary {
    pub points: u64,
    pub level: PlayerLevel,
    pub total: usize,
    pub earned: usize,
    pub in_progress: usize,
    /// `round(earned / total * 100)`, 0 for an empty catalog
    pub completion_percent: u32,
}

struct UserSession {
    ledger: ProgressLedger,
    celebrations: CelebrationSlot,
}

/// Explicitly constructed gamification engine
pub struct AchievementEngine {
    catalog: Arc<AchievementCatalog>,
    store: Arc<dyn PersistenceAdapter>,
    clock: Arc<dyn Clock>,
    timer: Arc<dyn Timer>,
    shares: ShareSnapshotService,
    settings: EngineSettings,
    sessions: HashMap<String, UserSession>,
    award_observers: Arc<Observers<AwardCallback>>,
    notification_observers: Arc<Observers<NotificationCallback>>,
    next_subscription: u64,
}

impl AchievementEngine {
    /// Engine on the wall clock with random uuid snapshot ids
    pub fn new(
        catalog: AchievementCatalog,
        store: Arc<dyn PersistenceAdapter>,
        timer: Arc<dyn Timer>,
    ) -> Self {
        Self::with_parts(
            catalog,
            store,
            timer,
            Arc::new(SystemClock),
            Arc::new(UuidGenerator::default()),
            EngineSettings::default(),
        )
    }

    /// Engine with every collaborator supplied by the caller
    pub fn with_parts(
        catalog: AchievementCatalog,
        store: Arc<dyn PersistenceAdapter>,
        timer: Arc<dyn Timer>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        settings: EngineSettings,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let shares = ShareSnapshotService::new(
            store.clone(),
            ids,
            clock.clone(),
            catalog.clone(),
            settings.namespace.clone(),
        );

        Self {
            catalog,
            store,
            clock,
            timer,
            shares,
            settings,
            sessions: HashMap::new(),
            award_observers: Arc::new(Observers::default()),
            notification_observers: Arc::new(Observers::default()),
            next_subscription: 1,
        }
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ========================================
    // SESSION LIFECYCLE
    // ========================================

    /// Load the user's persisted state. Implicit on first use of any user operation.
    pub fn open_session(&mut self, user_id: &str) -> Result<(), EngineError> {
        self.session(user_id).map(|_| ())
    }

    /// Tear down a user's session: cancels any pending celebration timer and
    /// retries a write that failed earlier. Returns false if the session was not open.
    pub fn end_session(&mut self, user_id: &str) -> bool {
        match self.sessions.remove(user_id) {
            Some(mut session) => {
                session.celebrations.close();
                if let Err(err) = session.ledger.flush() {
                    warn!(user_id, error = %err, "Dropping session with unsaved achievement state");
                }
                debug!(user_id, "Session ended");
                true
            }
            None => false,
        }
    }

    pub fn has_session(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    fn session(&mut self, user_id: &str) -> Result<&mut UserSession, EngineError> {
        match self.sessions.entry(user_id.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let ledger = ProgressLedger::load(self.store.clone(), &self.settings.namespace, user_id)?;

                if let Err(violation) = ledger.state().check_invariants(&self.catalog) {
                    warn!(user_id, %violation, "Loaded achievement state is inconsistent");
                }

                let celebrations = CelebrationSlot::new(
                    user_id,
                    self.settings.notification_duration,
                    self.timer.clone(),
                    self.clock.clone(),
                    self.notification_observers.clone(),
                );
                debug!(user_id, points = ledger.state().points, "Session opened");
                Ok(entry.insert(UserSession {
                    ledger,
                    celebrations,
                }))
            }
        }
    }

    fn lookup(&self, achievement_id: &str) -> Result<Achievement, EngineError> {
        self.catalog
            .get(achievement_id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownAchievement(achievement_id.to_string()))
    }

    // ========================================
    // PROGRESS & AWARDS
    // ========================================

    /// Record new progress towards an achievement.
    ///
    /// The value is clamped into `[0, max_progress]`. Reaching the ceiling earns the
    /// achievement exactly once. On a persistence failure the in-memory state keeps
    /// the update and the error is returned; retry the call to make it durable.
    pub fn update_progress(
        &mut self,
        user_id: &str,
        achievement_id: &str,
        new_progress: f64,
    ) -> Result<ProgressRecord, EngineError> {
        let achievement = self.lookup(achievement_id)?;
        let now = self.clock.now();

        let session = self.session(user_id)?;
        let record = session.ledger.apply_progress(
            &achievement.id,
            new_progress,
            achievement.max_progress,
        );
        debug!(
            user_id,
            achievement = %achievement.id,
            requested = new_progress,
            progress = record.progress,
            "Progress updated"
        );

        let events = if record.progress == achievement.max_progress && !record.is_earned() {
            Self::latch(&mut session.ledger, &achievement, now)
        } else {
            Vec::new()
        };

        let persisted = session.ledger.persist();
        let record = session.ledger.get(&achievement.id);

        self.finish_mutation(user_id, events, persisted)?;
        Ok(record)
    }

    /// Add one unit of progress unless the record is already at its ceiling
    pub fn increment_progress(
        &mut self,
        user_id: &str,
        achievement_id: &str,
    ) -> Result<ProgressRecord, EngineError> {
        let achievement = self.lookup(achievement_id)?;
        let session = self.session(user_id)?;
        let current = session.ledger.get(&achievement.id);

        if current.progress >= achievement.max_progress {
            Self::flush(user_id, session)?;
            return Ok(current);
        }
        self.update_progress(user_id, achievement_id, current.progress + 1.0)
    }

    /// Earn an achievement directly, regardless of progress.
    ///
    /// Returns true if this call earned it, false if it was already earned.
    pub fn award(&mut self, user_id: &str, achievement_id: &str) -> Result<bool, EngineError> {
        let achievement = self.lookup(achievement_id)?;
        let now = self.clock.now();

        let session = self.session(user_id)?;
        if session.ledger.get(&achievement.id).is_earned() {
            Self::flush(user_id, session)?;
            return Ok(false);
        }

        let events = Self::latch(&mut session.ledger, &achievement, now);
        let persisted = session.ledger.persist();

        self.finish_mutation(user_id, events, persisted)?;
        Ok(true)
    }

    /// The earn transition: latch, accrue points, and describe what happened
    fn latch(
        ledger: &mut ProgressLedger,
        achievement: &Achievement,
        now: DateTime<Utc>,
    ) -> Vec<GamificationEvent> {
        let old_level = ledger.state().level().level;
        if !ledger.latch_earned(&achievement.id, achievement.max_progress, achievement.points, now) {
            return Vec::new();
        }

        let state = ledger.state();
        info!(
            user_id = %state.user_id,
            achievement = %achievement.id,
            points = achievement.points,
            total_points = state.points,
            "Achievement unlocked"
        );

        let mut events = vec![GamificationEvent::AchievementUnlocked(UnlockedAchievement {
            user_id: state.user_id.clone(),
            achievement: achievement.clone(),
            earned_at: now,
            total_points: state.points,
        })];

        let new_level = state.level().level;
        if new_level > old_level {
            info!(user_id = %state.user_id, old_level, new_level, "Level up");
            events.push(GamificationEvent::LevelUp(LevelUp {
                user_id: state.user_id.clone(),
                old_level,
                new_level,
            }));
        }
        events
    }

    /// Write out state left behind by an earlier failed write
    fn flush(user_id: &str, session: &mut UserSession) -> Result<(), EngineError> {
        session.ledger.flush().inspect_err(|err| {
            warn!(user_id, error = %err, "Failed to persist achievement state");
        })
    }

    /// Check invariants, deliver events, queue celebrations, then report the write
    fn finish_mutation(
        &mut self,
        user_id: &str,
        events: Vec<GamificationEvent>,
        persisted: Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        let Some(session) = self.sessions.get(user_id) else {
            return persisted;
        };

        debug_assert_eq!(
            session.ledger.state().check_invariants(&self.catalog),
            Ok(()),
            "achievement invariants broken for {}",
            user_id
        );

        for event in &events {
            self.award_observers.publish(event);
            if let GamificationEvent::AchievementUnlocked(unlocked) = event {
                session.celebrations.celebrate(unlocked.clone());
            }
        }

        if let Err(err) = &persisted {
            warn!(user_id, error = %err, "Failed to persist achievement state");
        }
        persisted
    }

    // ========================================
    // QUERIES
    // ========================================

    /// Current state with derived level fields
    pub fn get_state(&mut self, user_id: &str) -> Result<UserStateView, EngineError> {
        let session = self.session(user_id)?;
        Ok(UserStateView::new(session.ledger.state()))
    }

    /// Earned achievements, oldest first
    pub fn get_earned(&mut self, user_id: &str) -> Result<Vec<EarnedAchievement>, EngineError> {
        let catalog = self.catalog.clone();
        let session = self.session(user_id)?;

        let mut earned: Vec<EarnedAchievement> = session
            .ledger
            .state()
            .earned()
            .filter_map(|record| {
                Some(EarnedAchievement {
                    achievement: catalog.get(&record.achievement_id)?.clone(),
                    earned_at: record.earned_at?,
                })
            })
            .collect();
        earned.sort_by(|a, b| {
            a.earned_at
                .cmp(&b.earned_at)
                .then_with(|| a.achievement.id.cmp(&b.achievement.id))
        });
        Ok(earned)
    }

    /// Every catalog entry with the user's record, in catalog order
    pub fn get_progress(
        &mut self,
        user_id: &str,
        category: Option<AchievementCategory>,
    ) -> Result<Vec<AchievementProgress>, EngineError> {
        let catalog = self.catalog.clone();
        let session = self.session(user_id)?;
        let state = session.ledger.state();

        Ok(catalog
            .iter()
            .filter(|a| category.is_none_or(|c| a.category == c))
            .map(|a| AchievementProgress {
                achievement: a.clone(),
                record: state.record(&a.id),
            })
            .collect())
    }

    /// Catalog entries the user has not earned yet
    pub fn get_in_progress(&mut self, user_id: &str) -> Result<Vec<AchievementProgress>, EngineError> {
        Ok(self
            .get_progress(user_id, None)?
            .into_iter()
            .filter(|p| !p.record.is_earned())
            .collect())
    }

    /// Dashboard totals, optionally restricted to one category
    pub fn summary(
        &mut self,
        user_id: &str,
        category: Option<AchievementCategory>,
    ) -> Result<AchievementSummary, EngineError> {
        let progress = self.get_progress(user_id, category)?;
        let points = self.session(user_id)?.ledger.state().points;

        let total = progress.len();
        let earned = progress.iter().filter(|p| p.record.is_earned()).count();
        let completion_percent = if total == 0 {
            0
        } else {
            ((earned as f64 / total as f64) * 100.0).round() as u32
        };

        Ok(AchievementSummary {
            points,
            level: PlayerLevel::new(points),
            total,
            earned,
            in_progress: total - earned,
            completion_percent,
        })
    }

    // ========================================
    // SHARING
    // ========================================

    /// Freeze the user's earned achievements into a shareable snapshot
    pub fn create_share_snapshot(
        &mut self,
        user_id: &str,
        display_name: &str,
    ) -> Result<String, EngineError> {
        let state = self.session(user_id)?.ledger.state().clone();
        self.shares.create_snapshot(&state, display_name)
    }

    /// Look up a snapshot; `Ok(None)` when it does not exist
    pub fn resolve_snapshot(&self, snapshot_id: &str) -> Result<Option<ShareSnapshot>, EngineError> {
        self.shares.resolve_snapshot(snapshot_id)
    }

    // ========================================
    // NOTIFICATIONS & SUBSCRIPTIONS
    // ========================================

    /// What the user's celebration slot shows right now
    pub fn notification_state(&self, user_id: &str) -> NotificationState {
        self.sessions
            .get(user_id)
            .map(|s| s.celebrations.state())
            .unwrap_or(NotificationState::Idle)
    }

    /// Celebrations waiting behind the current one
    pub fn pending_notifications(&self, user_id: &str) -> Vec<UnlockedAchievement> {
        self.sessions
            .get(user_id)
            .map(|s| s.celebrations.pending())
            .unwrap_or_default()
    }

    /// Hide the current celebration before its timeout
    pub fn dismiss_notification(&mut self, user_id: &str) -> bool {
        self.sessions
            .get(user_id)
            .is_some_and(|s| s.celebrations.dismiss())
    }

    /// Observe award and level-up events for every user, in award order
    pub fn subscribe_to_awards<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&GamificationEvent) + Send + Sync + 'static,
    {
        let id = self.next_subscription_id();
        self.award_observers.add(id, Arc::new(callback));
        id
    }

    /// Observe celebration slot changes as `(user_id, state)`
    pub fn subscribe_to_notification_state<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&str, &NotificationState) + Send + Sync + 'static,
    {
        let id = self.next_subscription_id();
        self.notification_observers.add(id, Arc::new(callback));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.award_observers.remove(id) || self.notification_observers.remove(id)
    }

    fn next_subscription_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        id
    }
}
