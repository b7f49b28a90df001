//! Settings configuration types

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::Config;
use crate::gamification::EngineSettings;
use crate::ids::UuidGenerator;

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Prefix for every storage key
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// How long an achievement celebration stays on screen
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,

    /// SQLite database path (defaults to ~/.edvantage/achievements.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Length of generated share snapshot ids (8-32)
    #[serde(default = "default_share_id_length")]
    pub share_id_length: usize,
}

fn default_namespace() -> String {
    "edvantage".to_string()
}

fn default_notification_duration_ms() -> u64 {
    5000
}

fn default_share_id_length() -> usize {
    UuidGenerator::DEFAULT_LEN
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            notification_duration_ms: default_notification_duration_ms(),
            database: None,
            share_id_length: default_share_id_length(),
        }
    }
}

impl Settings {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            namespace: self.namespace.clone(),
            notification_duration: Duration::from_millis(self.notification_duration_ms),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| Config::global_config_dir().join("achievements.db"))
    }

    pub fn id_generator(&self) -> UuidGenerator {
        UuidGenerator::new(self.share_id_length)
    }
}
