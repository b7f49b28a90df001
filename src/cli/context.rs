//! Engine construction shared by the commands

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::runtime::Handle;

use edvantage::clock::SystemClock;
use edvantage::config::Config;
use edvantage::store::SqliteStore;
use edvantage::{AchievementEngine, GamificationEvent, TokioTimer};

/// Resolve the config path - global config by default, `--config` overrides
pub fn resolve_config_path(config_override: Option<&PathBuf>) -> PathBuf {
    config_override
        .cloned()
        .unwrap_or_else(Config::global_config_path)
}

/// Load config and open an engine backed by the configured SQLite database
pub fn open_engine(config_override: Option<&PathBuf>) -> Result<(Config, AchievementEngine)> {
    let config_path = resolve_config_path(config_override);
    let config = Config::load_or_init(&config_path)?;

    let catalog = config
        .catalog()
        .with_context(|| format!("Invalid achievement catalog in {}", config_path.display()))?;

    let db_path = config.settings.database_path();
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open achievement db: {}", db_path.display()))?;

    let engine = AchievementEngine::with_parts(
        catalog,
        Arc::new(store),
        Arc::new(TokioTimer::new(Handle::current())),
        Arc::new(SystemClock),
        Arc::new(config.settings.id_generator()),
        config.settings.engine_settings(),
    );

    Ok((config, engine))
}

/// Print unlocks and level-ups as they happen
pub fn print_awards(engine: &mut AchievementEngine) {
    engine.subscribe_to_awards(|event| match event {
        GamificationEvent::AchievementUnlocked(unlocked) => {
            println!(
                "🏆 Achievement Unlocked! You earned \"{}\" and gained {} points!",
                unlocked.achievement.title, unlocked.achievement.points
            );
        }
        GamificationEvent::LevelUp(level_up) => {
            println!("🎉 Level up! {} → {}", level_up.old_level, level_up.new_level);
        }
    });
}
