//! Status and catalog commands

use std::path::PathBuf;

use anyhow::{Result, bail};

use super::context::open_engine;
use edvantage::AchievementCategory;

/// Parse a `--category` value
pub fn parse_category(value: Option<&str>) -> Result<Option<AchievementCategory>> {
    let Some(s) = value else {
        return Ok(None);
    };
    match s.to_lowercase().parse() {
        Ok(category) => Ok(Some(category)),
        Err(err) => {
            let known: Vec<&str> = AchievementCategory::all().iter().map(|c| c.as_str()).collect();
            bail!("{} (expected one of {})", err, known.join(", "));
        }
    }
}

/// Show level, points and per-achievement progress
pub async fn status_command(
    config_override: Option<&PathBuf>,
    user_id: &str,
    category: Option<String>,
) -> Result<()> {
    let category = parse_category(category.as_deref())?;
    let (_config, mut engine) = open_engine(config_override)?;

    let summary = engine.summary(user_id, category)?;
    let progress = engine.get_progress(user_id, category)?;
    engine.end_session(user_id);

    println!(
        "Level {} - {} points ({} to next level)",
        summary.level.level, summary.points, summary.level.points_to_next_level
    );
    println!(
        "Earned {}/{} ({}%), {} in progress\n",
        summary.earned, summary.total, summary.completion_percent, summary.in_progress
    );

    for entry in progress {
        let marker = if entry.record.is_earned() { "✓" } else { " " };
        let percent = entry.record.fraction(entry.achievement.max_progress) * 100.0;
        println!(
            "  [{}] {:<16} {:<22} {}/{} ({:.0}%)  {} pts",
            marker,
            entry.achievement.id,
            entry.achievement.title,
            entry.record.progress,
            entry.achievement.max_progress,
            percent,
            entry.achievement.points
        );
    }

    Ok(())
}

/// List the configured catalog
pub async fn catalog_command(config_override: Option<&PathBuf>, category: Option<String>) -> Result<()> {
    let category = parse_category(category.as_deref())?;
    let (_config, engine) = open_engine(config_override)?;

    let entries: Vec<_> = engine
        .catalog()
        .iter()
        .filter(|a| category.is_none_or(|c| a.category == c))
        .collect();

    if entries.is_empty() {
        println!("No achievements found.");
        return Ok(());
    }

    println!("Achievements ({}):\n", entries.len());
    for a in entries {
        println!("  {} [{}] {} pts", a.id, a.category.label(), a.points);
        println!("    {} - {}", a.title, a.description);
    }
    Ok(())
}
