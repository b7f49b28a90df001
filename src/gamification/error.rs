//! Error types for the achievement engine

use crate::store::StoreError;

/// Error surfaced by engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The id is not in the catalog; usually a catalog/caller version mismatch
    #[error("Unknown achievement: {0}")]
    UnknownAchievement(String),

    /// The store failed. In-memory state may already reflect the mutation; retry the
    /// whole update to make it durable.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StoreError),

    #[error("Failed to encode or decode stored state: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Problem found while authoring a catalog
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("Achievement id must not be empty")]
    EmptyId,

    #[error("Duplicate achievement id: {0}")]
    DuplicateId(String),

    #[error("Achievement {0} must be worth at least one point")]
    ZeroPoints(String),

    #[error("Achievement {id} has invalid max progress {max_progress}")]
    InvalidMaxProgress { id: String, max_progress: f64 },

    #[error("Unknown achievement category: {0}")]
    UnknownCategory(String),
}

/// A broken ledger invariant. Indicates a programming error or tampered storage.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvariantViolation {
    #[error("{id}: progress {progress} outside [0, {max_progress}]")]
    ProgressOutOfRange {
        id: String,
        progress: f64,
        max_progress: f64,
    },

    #[error("{id}: earned but progress {progress} never reached {max_progress}")]
    EarnedBelowCeiling {
        id: String,
        progress: f64,
        max_progress: f64,
    },

    #[error("{id}: progress reached the ceiling but the achievement was not earned")]
    CeilingNotEarned { id: String },

    #[error("points {points} differ from earned total {expected}")]
    PointsDrift { points: u64, expected: u64 },
}
