//! Per-user progress ledger
//!
//! Holds one [`ProgressRecord`] per achievement the user has touched, plus the
//! user's point total, and writes the whole aggregate back to the store after
//! every mutation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::AchievementCatalog;
use super::error::{EngineError, InvariantViolation};
use super::levels::PlayerLevel;
use crate::store::{PersistenceAdapter, user_state_key};

/// Progress of one user towards one achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub achievement_id: String,
    pub progress: f64,
    /// Set once, when progress first reaches the ceiling; never cleared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earned_at: Option<DateTime<Utc>>,
}

impl ProgressRecord {
    /// Fresh record: no progress, not earned
    pub fn new(achievement_id: impl Into<String>) -> Self {
        Self {
            achievement_id: achievement_id.into(),
            progress: 0.0,
            earned_at: None,
        }
    }

    pub fn is_earned(&self) -> bool {
        self.earned_at.is_some()
    }

    /// Progress as a 0.0-1.0 fraction of `max_progress`
    pub fn fraction(&self, max_progress: f64) -> f64 {
        if max_progress <= 0.0 {
            return 0.0;
        }
        (self.progress / max_progress).clamp(0.0, 1.0)
    }
}

/// Everything the engine persists for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserGamificationState {
    pub user_id: String,
    /// Sum of points over earned achievements; only ever grows
    pub points: u64,
    #[serde(default)]
    pub records: BTreeMap<String, ProgressRecord>,
}

impl UserGamificationState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            points: 0,
            records: BTreeMap::new(),
        }
    }

    /// Existing record or a fresh default; never inserts
    pub fn record(&self, achievement_id: &str) -> ProgressRecord {
        self.records
            .get(achievement_id)
            .cloned()
            .unwrap_or_else(|| ProgressRecord::new(achievement_id))
    }

    pub fn earned(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.records.values().filter(|r| r.is_earned())
    }

    pub fn level(&self) -> PlayerLevel {
        PlayerLevel::new(self.points)
    }

    /// Verify the clamp, latch and points invariants against `catalog`.
    ///
    /// Records whose id is missing from the catalog are skipped. If one of them is
    /// earned its point value is unknown, so the points total is not checked either.
    pub fn check_invariants(&self, catalog: &AchievementCatalog) -> Result<(), InvariantViolation> {
        let mut expected = 0u64;
        let mut points_verifiable = true;

        for record in self.records.values() {
            let Some(achievement) = catalog.get(&record.achievement_id) else {
                if record.is_earned() {
                    points_verifiable = false;
                }
                continue;
            };
            let max = achievement.max_progress;

            if !(0.0..=max).contains(&record.progress) {
                return Err(InvariantViolation::ProgressOutOfRange {
                    id: record.achievement_id.clone(),
                    progress: record.progress,
                    max_progress: max,
                });
            }

            match (record.is_earned(), record.progress == max) {
                (true, false) => {
                    return Err(InvariantViolation::EarnedBelowCeiling {
                        id: record.achievement_id.clone(),
                        progress: record.progress,
                        max_progress: max,
                    });
                }
                (false, true) => {
                    return Err(InvariantViolation::CeilingNotEarned {
                        id: record.achievement_id.clone(),
                    });
                }
                _ => {}
            }

            if record.is_earned() {
                expected += u64::from(achievement.points);
            }
        }

        if points_verifiable && self.points != expected {
            return Err(InvariantViolation::PointsDrift {
                points: self.points,
                expected,
            });
        }
        Ok(())
    }
}

/// Normalize a progress value into `[0, max_progress]`.
///
/// Negative, NaN and infinite inputs count as no progress.
pub fn clamp_progress(value: f64, max_progress: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    value.min(max_progress)
}

/// A user's progress records backed by a [`PersistenceAdapter`]
pub struct ProgressLedger {
    state: UserGamificationState,
    store: Arc<dyn PersistenceAdapter>,
    key: String,
    /// In-memory state is ahead of the store after a failed write
    dirty: bool,
}

impl ProgressLedger {
    /// Load the user's aggregate, or start empty if nothing is stored yet
    pub fn load(
        store: Arc<dyn PersistenceAdapter>,
        namespace: &str,
        user_id: &str,
    ) -> Result<Self, EngineError> {
        let key = user_state_key(namespace, user_id);
        let state = match store.get(&key)? {
            Some(bytes) => {
                let mut state: UserGamificationState = serde_json::from_slice(&bytes)?;
                // The key is authoritative for identity
                state.user_id = user_id.to_string();
                state
            }
            None => UserGamificationState::new(user_id),
        };

        Ok(Self {
            state,
            store,
            key,
            dirty: false,
        })
    }

    pub fn state(&self) -> &UserGamificationState {
        &self.state
    }

    /// Current record for `achievement_id`; unknown ids read as no progress
    pub fn get(&self, achievement_id: &str) -> ProgressRecord {
        self.state.record(achievement_id)
    }

    /// Clamp and store new progress, then persist the aggregate.
    ///
    /// Reaching the ceiling does not set `earned_at`; the engine owns that transition.
    pub fn set_progress(
        &mut self,
        achievement_id: &str,
        new_progress: f64,
        max_progress: f64,
    ) -> Result<ProgressRecord, EngineError> {
        let record = self.apply_progress(achievement_id, new_progress, max_progress);
        self.persist()?;
        Ok(record)
    }

    /// In-memory half of [`set_progress`](Self::set_progress).
    ///
    /// Lower values overwrite in-progress records. Earned records stay at the ceiling.
    pub(crate) fn apply_progress(
        &mut self,
        achievement_id: &str,
        new_progress: f64,
        max_progress: f64,
    ) -> ProgressRecord {
        let record = self
            .state
            .records
            .entry(achievement_id.to_string())
            .or_insert_with(|| ProgressRecord::new(achievement_id));

        if !record.is_earned() {
            record.progress = clamp_progress(new_progress, max_progress);
        }
        record.clone()
    }

    /// Latch `earned_at` and accrue `points`. Returns false if already earned.
    pub(crate) fn latch_earned(
        &mut self,
        achievement_id: &str,
        max_progress: f64,
        points: u32,
        at: DateTime<Utc>,
    ) -> bool {
        let record = self
            .state
            .records
            .entry(achievement_id.to_string())
            .or_insert_with(|| ProgressRecord::new(achievement_id));

        if record.is_earned() {
            return false;
        }

        record.progress = max_progress;
        record.earned_at = Some(at);
        self.state.points = self.state.points.saturating_add(u64::from(points));
        true
    }

    /// Write the full aggregate to the store.
    ///
    /// A failed write marks the ledger dirty until a later write succeeds.
    pub fn persist(&mut self) -> Result<(), EngineError> {
        let written = serde_json::to_vec(&self.state)
            .map_err(EngineError::from)
            .and_then(|bytes| self.store.set(&self.key, &bytes).map_err(EngineError::from));

        self.dirty = written.is_err();
        written
    }

    /// True when the last write failed and nothing has been written since
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Retry the write only if the store is behind
    pub fn flush(&mut self) -> Result<(), EngineError> {
        if self.dirty {
            self.persist()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    fn ledger() -> (Arc<MemoryStore>, ProgressLedger) {
        let store = Arc::new(MemoryStore::new());
        let ledger = ProgressLedger::load(store.clone(), "test", "u1").unwrap();
        (store, ledger)
    }

    #[test]
    fn test_get_does_not_touch_storage() {
        let (store, ledger) = ledger();
        let record = ledger.get("task-master-1");
        assert_eq!(record.progress, 0.0);
        assert!(record.earned_at.is_none());
        assert!(store.is_empty());
        assert!(ledger.state().records.is_empty());
    }

    #[test]
    fn test_set_progress_clamps_and_persists() {
        let (store, mut ledger) = ledger();

        let record = ledger.set_progress("task-master-1", 15.0, 10.0).unwrap();
        assert_eq!(record.progress, 10.0);
        // the ledger never latches on its own
        assert!(record.earned_at.is_none());

        let record = ledger.set_progress("social-1", -3.0, 3.0).unwrap();
        assert_eq!(record.progress, 0.0);

        let record = ledger.set_progress("social-1", f64::NAN, 3.0).unwrap();
        assert_eq!(record.progress, 0.0);

        let record = ledger.set_progress("social-1", f64::INFINITY, 3.0).unwrap();
        assert_eq!(record.progress, 0.0);

        assert_eq!(store.keys(), vec!["test-achievements-u1".to_string()]);
        let reloaded = ProgressLedger::load(store, "test", "u1").unwrap();
        assert_eq!(reloaded.get("task-master-1").progress, 10.0);
    }

    #[test]
    fn test_lower_progress_overwrites_until_earned() {
        let (_store, mut ledger) = ledger();
        ledger.set_progress("a-1", 7.0, 10.0).unwrap();
        assert_eq!(ledger.set_progress("a-1", 3.0, 10.0).unwrap().progress, 3.0);

        let at = DateTime::from_timestamp_millis(1_000).unwrap();
        assert!(ledger.latch_earned("a-1", 10.0, 40, at));
        assert_eq!(ledger.set_progress("a-1", 2.0, 10.0).unwrap().progress, 10.0);
    }

    #[test]
    fn test_fraction_of_ceiling() {
        let mut record = ProgressRecord::new("a-1");
        assert_eq!(record.fraction(10.0), 0.0);
        record.progress = 7.0;
        assert_eq!(record.fraction(10.0), 0.7);
        assert_eq!(record.fraction(5.0), 1.0);
        assert_eq!(record.fraction(0.0), 0.0);
    }

    #[test]
    fn test_latch_is_one_way() {
        let (_store, mut ledger) = ledger();
        let first = DateTime::from_timestamp_millis(1_000).unwrap();
        let later = DateTime::from_timestamp_millis(9_000).unwrap();

        assert!(ledger.latch_earned("a-1", 5.0, 40, first));
        assert!(!ledger.latch_earned("a-1", 5.0, 40, later));

        let record = ledger.get("a-1");
        assert_eq!(record.earned_at, Some(first));
        assert_eq!(record.progress, 5.0);
        assert_eq!(ledger.state().points, 40);
    }

    #[test]
    fn test_points_saturate_instead_of_wrapping() {
        let (_store, mut ledger) = ledger();
        ledger.state.points = u64::MAX - 10;
        let at = DateTime::from_timestamp_millis(1_000).unwrap();

        assert!(ledger.latch_earned("a-1", 5.0, 40, at));
        assert_eq!(ledger.state().points, u64::MAX);
    }

    #[test]
    fn test_check_invariants_detects_drift() {
        let catalog = AchievementCatalog::seeded();
        let mut state = UserGamificationState::new("u1");
        assert!(state.check_invariants(&catalog).is_ok());

        state.points = 10;
        assert_eq!(
            state.check_invariants(&catalog),
            Err(InvariantViolation::PointsDrift { points: 10, expected: 0 })
        );

        state.points = 0;
        state.records.insert(
            "social-1".into(),
            ProgressRecord {
                achievement_id: "social-1".into(),
                progress: 3.0,
                earned_at: None,
            },
        );
        assert!(matches!(
            state.check_invariants(&catalog),
            Err(InvariantViolation::CeilingNotEarned { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_clamp_stays_in_range(value in -1.0e9f64..1.0e9, max in 0.5f64..1_000.0) {
            let clamped = clamp_progress(value, max);
            prop_assert!((0.0..=max).contains(&clamped));
            if value > max {
                prop_assert_eq!(clamped, max);
            }
            if value < 0.0 {
                prop_assert_eq!(clamped, 0.0);
            }
        }
    }
}
