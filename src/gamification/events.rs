//! Events emitted by the award flow

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::catalog::Achievement;

/// An achievement that was just earned
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockedAchievement {
    pub user_id: String,
    pub achievement: Achievement,
    pub earned_at: DateTime<Utc>,
    /// User's points right after the award
    pub total_points: u64,
}

impl UnlockedAchievement {
    pub fn achievement_id(&self) -> &str {
        &self.achievement.id
    }
}

/// The derived level moved up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelUp {
    pub user_id: String,
    pub old_level: u64,
    pub new_level: u64,
}

/// Everything award subscribers can observe, in award order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GamificationEvent {
    AchievementUnlocked(UnlockedAchievement),
    LevelUp(LevelUp),
}
