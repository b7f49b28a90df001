//! Opaque identifier generation for share snapshots

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Produces unique, URL-safe identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 uuids in simple (hex, no dashes) form, truncated to `len` characters
#[derive(Debug, Clone, Copy)]
pub struct UuidGenerator {
    len: usize,
}

impl UuidGenerator {
    /// Shortest id accepted; 8 hex chars is 32 bits of randomness
    pub const MIN_LEN: usize = 8;
    pub const MAX_LEN: usize = 32;
    /// Length used when nothing is configured
    pub const DEFAULT_LEN: usize = 8;

    pub fn new(len: usize) -> Self {
        Self {
            len: len.clamp(Self::MIN_LEN, Self::MAX_LEN),
        }
    }
}

impl Default for UuidGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEN)
    }
}

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(self.len);
        id
    }
}

/// Deterministic ids (`{prefix}{n}`) for tests and fixtures
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}{}", self.prefix, n)
    }
}
