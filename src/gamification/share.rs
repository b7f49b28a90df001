//! Shareable proof-of-progress snapshots
//!
//! A snapshot is a frozen copy of a user's earned achievements and points, stored
//! under its own random id. Later progress never touches it, and it outlives the
//! session that created it. Snapshots do not expire.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::catalog::AchievementCatalog;
use super::error::EngineError;
use super::ledger::UserGamificationState;
use crate::clock::Clock;
use crate::ids::IdGenerator;
use crate::store::{PersistenceAdapter, StoreError, snapshot_key};

/// Fresh ids tried before giving up on a collision
const MAX_ID_ATTEMPTS: usize = 5;

/// One earned achievement as it appears on a shared page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedAchievement {
    pub id: String,
    pub title: String,
    pub points: u32,
    pub earned_at: DateTime<Utc>,
}

/// Immutable public view of a user's progress at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSnapshot {
    pub snapshot_id: String,
    pub user_id: String,
    pub display_name: String,
    pub points: u64,
    pub achievements: Vec<SharedAchievement>,
    pub created_at: DateTime<Utc>,
}

/// Creates and resolves share snapshots
pub struct ShareSnapshotService {
    store: Arc<dyn PersistenceAdapter>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    catalog: Arc<AchievementCatalog>,
    namespace: String,
}

impl ShareSnapshotService {
    pub fn new(
        store: Arc<dyn PersistenceAdapter>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        catalog: Arc<AchievementCatalog>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            ids,
            clock,
            catalog,
            namespace: namespace.into(),
        }
    }

    /// Freeze the earned part of `state` and store it. Returns the new snapshot id.
    pub fn create_snapshot(
        &self,
        state: &UserGamificationState,
        display_name: &str,
    ) -> Result<String, EngineError> {
        let mut achievements: Vec<SharedAchievement> = state
            .earned()
            .filter_map(|record| {
                let earned_at = record.earned_at?;
                let Some(achievement) = self.catalog.get(&record.achievement_id) else {
                    debug!(id = %record.achievement_id, "Skipping earned achievement missing from catalog");
                    return None;
                };
                Some(SharedAchievement {
                    id: achievement.id.clone(),
                    title: achievement.title.clone(),
                    points: achievement.points,
                    earned_at,
                })
            })
            .collect();
        achievements.sort_by(|a, b| a.earned_at.cmp(&b.earned_at).then_with(|| a.id.cmp(&b.id)));

        let snapshot_id = self.allocate_id()?;
        let snapshot = ShareSnapshot {
            snapshot_id: snapshot_id.clone(),
            user_id: state.user_id.clone(),
            display_name: display_name.to_string(),
            points: state.points,
            achievements,
            created_at: self.clock.now(),
        };

        let bytes = serde_json::to_vec(&snapshot)?;
        self.store
            .set(&snapshot_key(&self.namespace, &snapshot_id), &bytes)?;

        info!(
            user_id = %state.user_id,
            snapshot_id = %snapshot_id,
            earned = snapshot.achievements.len(),
            points = snapshot.points,
            "Created share snapshot"
        );
        Ok(snapshot_id)
    }

    /// Look a snapshot up. Unknown or malformed ids are `Ok(None)`.
    pub fn resolve_snapshot(&self, snapshot_id: &str) -> Result<Option<ShareSnapshot>, EngineError> {
        if !is_valid_snapshot_id(snapshot_id) {
            return Ok(None);
        }

        match self.store.get(&snapshot_key(&self.namespace, snapshot_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Draw ids until one is unused; snapshots are write-once
    fn allocate_id(&self) -> Result<String, EngineError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if !is_valid_snapshot_id(&id) {
                continue;
            }
            if self.store.get(&snapshot_key(&self.namespace, &id))?.is_none() {
                return Ok(id);
            }
        }
        Err(StoreError::Backend(format!(
            "could not allocate an unused snapshot id after {} attempts",
            MAX_ID_ATTEMPTS
        ))
        .into())
    }
}

/// Non-empty, URL-safe (`[A-Za-z0-9_-]`)
pub fn is_valid_snapshot_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
