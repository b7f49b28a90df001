//! Achievement authoring in TOML

use serde::{Deserialize, Serialize};

use crate::gamification::{Achievement, AchievementCategory};

/// One `[[achievement]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementConfigToml {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub points: u32,
    pub max_progress: f64,
    /// Inferred from the id prefix when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AchievementCategory>,
}

impl AchievementConfigToml {
    pub fn to_achievement(&self) -> Achievement {
        let achievement = Achievement::new(
            self.id.clone(),
            self.title.clone(),
            self.description.clone(),
            self.points,
            self.max_progress,
        );
        match self.category {
            Some(category) => achievement.with_category(category),
            None => achievement,
        }
    }
}

impl From<&Achievement> for AchievementConfigToml {
    fn from(achievement: &Achievement) -> Self {
        Self {
            id: achievement.id.clone(),
            title: achievement.title.clone(),
            description: achievement.description.clone(),
            points: achievement.points,
            max_progress: achievement.max_progress,
            category: Some(achievement.category),
        }
    }
}
