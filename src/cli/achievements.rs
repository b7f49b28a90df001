//! Progress and award commands

use std::path::PathBuf;

use anyhow::Result;

use super::context::{open_engine, print_awards};
use edvantage::ProgressRecord;

/// How a command changes progress
pub enum ProgressChange {
    Set(f64),
    Increment,
}

/// Apply a progress change for `user_id`
pub async fn progress_command(
    config_override: Option<&PathBuf>,
    user_id: &str,
    achievement_id: &str,
    change: ProgressChange,
) -> Result<()> {
    let (_config, mut engine) = open_engine(config_override)?;
    print_awards(&mut engine);

    let record = match change {
        ProgressChange::Set(value) => engine.update_progress(user_id, achievement_id, value),
        ProgressChange::Increment => engine.increment_progress(user_id, achievement_id),
    };
    if let (Ok(record), Some(achievement)) = (&record, engine.catalog().get(achievement_id)) {
        print_record(&achievement.title, record, achievement.max_progress);
    }

    engine.end_session(user_id);
    record?;
    Ok(())
}

/// Earn an achievement outright
pub async fn award_command(
    config_override: Option<&PathBuf>,
    user_id: &str,
    achievement_id: &str,
) -> Result<()> {
    let (_config, mut engine) = open_engine(config_override)?;
    print_awards(&mut engine);

    let newly = engine.award(user_id, achievement_id);
    engine.end_session(user_id);

    if !newly? {
        println!("Already earned: {}", achievement_id);
    }
    Ok(())
}

fn print_record(title: &str, record: &ProgressRecord, max_progress: f64) {
    let status = match record.earned_at {
        Some(at) => format!("earned {}", at.format("%Y-%m-%d")),
        None => "in progress".to_string(),
    };
    println!("{}: {}/{} ({})", title, record.progress, max_progress, status);
}
