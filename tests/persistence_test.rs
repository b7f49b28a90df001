//! SQLite-backed engine survives a restart

use std::sync::Arc;

use tempfile::TempDir;

use edvantage::clock::ManualClock;
use edvantage::ids::SequentialIds;
use edvantage::store::{PersistenceAdapter, SqliteStore, user_state_key};
use edvantage::{AchievementCatalog, AchievementEngine, EngineSettings, ManualTimer};

fn open_engine(store: SqliteStore) -> AchievementEngine {
    AchievementEngine::with_parts(
        AchievementCatalog::seeded(),
        Arc::new(store),
        Arc::new(ManualTimer::new()),
        Arc::new(ManualClock::at_millis(1_700_000_000_000)),
        Arc::new(SequentialIds::new("s")),
        EngineSettings::default(),
    )
}

#[test]
fn test_progress_and_snapshots_survive_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("nested").join("achievements.db");

    let snapshot_id = {
        let mut engine = open_engine(SqliteStore::open(&db_path).unwrap());
        engine.update_progress("u1", "streak-1", 4.0).unwrap();
        engine.award("u1", "learning-1").unwrap();
        let id = engine.create_share_snapshot("u1", "Grace").unwrap();
        engine.end_session("u1");
        id
    };

    let store = SqliteStore::open(&db_path).unwrap();
    assert!(store.get(&user_state_key("edvantage", "u1")).unwrap().is_some());

    let mut engine = open_engine(store);
    let state = engine.get_state("u1").unwrap();
    assert_eq!(state.points, 150);
    assert_eq!(state.level, 2);
    let streak = state
        .records
        .iter()
        .find(|r| r.achievement_id == "streak-1")
        .unwrap();
    assert_eq!(streak.progress, 4.0);

    let snapshot = engine.resolve_snapshot(&snapshot_id).unwrap().unwrap();
    assert_eq!(snapshot.display_name, "Grace");
    assert_eq!(snapshot.achievements.len(), 1);
}

#[test]
fn test_namespaces_do_not_collide() {
    let store = SqliteStore::open_in_memory().unwrap();

    let mut a = open_engine(store.clone());
    let mut b = AchievementEngine::with_parts(
        AchievementCatalog::seeded(),
        Arc::new(store.clone()),
        Arc::new(ManualTimer::new()),
        Arc::new(ManualClock::at_millis(0)),
        Arc::new(SequentialIds::new("t")),
        EngineSettings {
            namespace: "other".to_string(),
            ..EngineSettings::default()
        },
    );

    a.award("u1", "social-1").unwrap();
    assert_eq!(b.get_state("u1").unwrap().points, 0);
    assert_eq!(store.keys_with_prefix("edvantage-").unwrap().len(), 1);
}
