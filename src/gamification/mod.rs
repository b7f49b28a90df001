//! Gamification system: achievements, points, levels, celebrations and sharing
//!
//! # Flow
//!
//! ```text
//! activity signal ──► AchievementEngine::update_progress
//!                         │
//!                         ├─► ProgressLedger (clamp, persist)
//!                         │
//!                         └─► ceiling reached for the first time?
//!                                 ├─► latch earned_at, accrue points
//!                                 ├─► award subscribers (unlock, level up)
//!                                 └─► celebration slot ──► Timer ──► next in queue
//! ```
//!
//! Share snapshots are created on demand and never touched by the award flow.

mod catalog;
mod celebration;
mod engine;
mod error;
mod events;
mod ledger;
mod levels;
mod notifications;
mod observers;
mod share;
mod timer;

pub use catalog::{Achievement, AchievementCatalog, AchievementCategory};
pub use engine::{
    AchievementEngine, AchievementProgress, AchievementSummary, EarnedAchievement, EngineSettings,
    UserStateView,
};
pub use error::{CatalogError, EngineError, InvariantViolation};
pub use events::{GamificationEvent, LevelUp, UnlockedAchievement};
pub use ledger::{ProgressLedger, ProgressRecord, UserGamificationState, clamp_progress};
pub use levels::{LevelCalculator, PlayerLevel};
pub use notifications::{
    DEFAULT_NOTIFICATION_DURATION, NotificationScheduler, NotificationState, TimeoutRequest,
};
pub use observers::{AwardCallback, NotificationCallback, SubscriptionId};
pub use share::{ShareSnapshot, ShareSnapshotService, SharedAchievement, is_valid_snapshot_id};
pub use timer::{ManualTimer, Timer, TimerCallback, TimerHandle, TokioTimer};
