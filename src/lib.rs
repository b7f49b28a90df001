//! Edvantage achievements
//!
//! Turns raw activity signals (tasks completed, login streaks, messages sent) into
//! durable progress records, awards badges exactly once, accrues points, derives a
//! level, celebrates each award for a few seconds and produces shareable snapshots.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Arc::new(SqliteStore::open(&path)?);
//! let timer = Arc::new(TokioTimer::try_current().expect("tokio runtime"));
//! let mut engine = AchievementEngine::new(AchievementCatalog::seeded(), store, timer);
//!
//! engine.update_progress("user-42", "task-master-1", 10.0)?;
//! let state = engine.get_state("user-42")?;
//! let snapshot_id = engine.create_share_snapshot("user-42", "Ada")?;
//! ```

pub mod clock;
pub mod config;
pub mod gamification;
pub mod ids;
pub mod store;

pub use gamification::*;
