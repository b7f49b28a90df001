//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use edvantage::clock::ManualClock;
use edvantage::ids::SequentialIds;
use edvantage::store::{MemoryStore, PersistenceAdapter};
use edvantage::{
    Achievement, AchievementCatalog, AchievementEngine, EngineSettings, GamificationEvent,
    ManualTimer, NotificationState,
};

pub const USER: &str = "student-1";

/// Engine wired to in-memory collaborators the test can drive
pub struct TestEngine {
    pub engine: AchievementEngine,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub timer: ManualTimer,
}

/// Three achievements: task-1 (100 pts / 10), attendance-1 (50 pts / 5), social-1 (75 pts / 3)
pub fn small_catalog() -> AchievementCatalog {
    AchievementCatalog::new(vec![
        Achievement::new("task-1", "Task Master", "Complete 10 tasks", 100, 10.0),
        Achievement::new("attendance-1", "Perfect Attendance", "Attend 5 classes", 50, 5.0),
        Achievement::new("social-1", "Team Player", "Join 3 study groups", 75, 3.0),
    ])
    .expect("valid test catalog")
}

pub fn engine_with(catalog: AchievementCatalog, store: Arc<MemoryStore>) -> TestEngine {
    let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
    let timer = ManualTimer::new();
    let engine = AchievementEngine::with_parts(
        catalog,
        store.clone() as Arc<dyn PersistenceAdapter>,
        Arc::new(timer.clone()),
        clock.clone(),
        Arc::new(SequentialIds::new("share")),
        EngineSettings::default(),
    );
    TestEngine {
        engine,
        store,
        clock,
        timer,
    }
}

pub fn test_engine() -> TestEngine {
    engine_with(small_catalog(), Arc::new(MemoryStore::new()))
}

/// Collects every award event
pub fn record_awards(engine: &mut AchievementEngine) -> Arc<Mutex<Vec<GamificationEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.subscribe_to_awards(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

/// Collects the id shown on each notification change (`None` for idle)
pub fn record_notifications(engine: &mut AchievementEngine) -> Arc<Mutex<Vec<Option<String>>>> {
    let shown = Arc::new(Mutex::new(Vec::new()));
    let sink = shown.clone();
    engine.subscribe_to_notification_state(move |_, state: &NotificationState| {
        sink.lock()
            .unwrap()
            .push(state.showing_id().map(str::to_string));
    });
    shown
}

pub fn unlock_ids(events: &[GamificationEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            GamificationEvent::AchievementUnlocked(u) => Some(u.achievement.id.clone()),
            _ => None,
        })
        .collect()
}
