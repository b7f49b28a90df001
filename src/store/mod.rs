//! Keyed persistence used by the achievement ledger and share snapshots
//!
//! The engine only needs `get`/`set`/`remove` over byte values. Two backends ship
//! with the crate:
//!
//! - [`MemoryStore`]: process-local map, nothing survives a restart
//! - [`SqliteStore`]: single-table SQLite database (`~/.edvantage/achievements.db`)
//!
//! No transactional guarantees are assumed. Every write from the engine is a full
//! snapshot of one aggregate, so two sessions writing the same user race on
//! last-writer-wins.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Error raised by a persistence backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Keyed byte storage
pub trait PersistenceAdapter: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Key of a user's ledger + points aggregate
pub fn user_state_key(namespace: &str, user_id: &str) -> String {
    format!("{}-achievements-{}", namespace, user_id)
}

/// Key of a share snapshot
pub fn snapshot_key(namespace: &str, snapshot_id: &str) -> String {
    format!("{}-share-{}", namespace, snapshot_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(user_state_key("edvantage", "u1"), "edvantage-achievements-u1");
        assert_eq!(snapshot_key("edvantage", "ab12cd34"), "edvantage-share-ab12cd34");
    }
}
