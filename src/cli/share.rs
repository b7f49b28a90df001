//! Share snapshot commands

use std::path::PathBuf;

use anyhow::Result;

use super::context::open_engine;

/// Freeze the user's earned achievements and print the snapshot id
pub async fn share_command(
    config_override: Option<&PathBuf>,
    user_id: &str,
    display_name: &str,
) -> Result<()> {
    let (_config, mut engine) = open_engine(config_override)?;
    let snapshot_id = engine.create_share_snapshot(user_id, display_name);
    engine.end_session(user_id);

    println!("{}", snapshot_id?);
    Ok(())
}

/// Print a stored snapshot
pub async fn resolve_command(
    config_override: Option<&PathBuf>,
    snapshot_id: &str,
    json: bool,
) -> Result<()> {
    let (_config, engine) = open_engine(config_override)?;

    let Some(snapshot) = engine.resolve_snapshot(snapshot_id)? else {
        println!("Snapshot not found: {}", snapshot_id);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "{} - {} points, {} achievements (shared {})",
        snapshot.display_name,
        snapshot.points,
        snapshot.achievements.len(),
        snapshot.created_at.format("%Y-%m-%d")
    );
    for a in &snapshot.achievements {
        println!(
            "  {} ({} pts) earned {}",
            a.title,
            a.points,
            a.earned_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
