//! Configuration loading and management
//!
//! ```toml
//! [settings]
//! namespace = "edvantage"
//! notification_duration_ms = 5000
//!
//! [[achievement]]
//! id = "task-master-1"
//! title = "Task Master"
//! description = "Complete 10 tasks"
//! points = 100
//! max_progress = 10
//! ```

mod achievement;
mod io;
mod settings;

pub use achievement::AchievementConfigToml;
pub use settings::Settings;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::gamification::{AchievementCatalog, CatalogError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// Achievement catalog. Empty means the built-in catalog.
    #[serde(default, rename = "achievement", skip_serializing_if = "Vec::is_empty")]
    pub achievements: Vec<AchievementConfigToml>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Config with the built-in catalog written out, so it can be edited
    pub fn with_defaults() -> Self {
        let catalog = AchievementCatalog::seeded();
        Self {
            settings: Settings::default(),
            achievements: catalog.iter().map(AchievementConfigToml::from).collect(),
        }
    }

    /// Build the validated catalog described by this config
    pub fn catalog(&self) -> Result<AchievementCatalog, CatalogError> {
        if self.achievements.is_empty() {
            return Ok(AchievementCatalog::seeded());
        }
        AchievementCatalog::new(
            self.achievements
                .iter()
                .map(AchievementConfigToml::to_achievement)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gamification::AchievementCategory;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_builtin_catalog() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.settings.namespace, "edvantage");
        assert_eq!(config.catalog().unwrap().len(), 7);
        assert_eq!(
            config.settings.engine_settings().notification_duration,
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn test_parse_custom_catalog() {
        let config: Config = toml::from_str(
            r#"
            [settings]
            namespace = "school"
            notification_duration_ms = 2500

            [[achievement]]
            id = "streak-30"
            title = "Unstoppable"
            points = 300
            max_progress = 30

            [[achievement]]
            id = "bonus-1"
            title = "Bonus"
            description = "Found the easter egg"
            points = 5
            max_progress = 1
            category = "learning"
            "#,
        )
        .unwrap();

        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("streak-30").unwrap().category, AchievementCategory::Streak);
        assert_eq!(catalog.get("bonus-1").unwrap().category, AchievementCategory::Learning);
        assert_eq!(catalog.get("streak-30").unwrap().description, "");

        let engine = config.settings.engine_settings();
        assert_eq!(engine.namespace, "school");
        assert_eq!(engine.notification_duration, Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_catalog_is_reported() {
        let config: Config = toml::from_str(
            r#"
            [[achievement]]
            id = "a-1"
            title = "A"
            points = 10
            max_progress = 0
            "#,
        )
        .unwrap();
        assert!(matches!(config.catalog(), Err(CatalogError::InvalidMaxProgress { .. })));
    }
}
