//! Store traits
//!
//! Async key-value interface consumed by the session core.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::CacheResult;

/// Outcome of an atomic compare-and-delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareAndDelete {
    /// The value matched and the entry was removed
    Deleted,
    /// No live entry exists (never written, deleted, or expired)
    Absent,
    /// A live entry exists with a different value; it was left in place
    Mismatch,
}

impl CompareAndDelete {
    /// Whether this caller won the delete
    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Key-value store with per-entry TTL
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value and TTL
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Read the live value under `key`
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Remove `key`, returning whether a live entry existed
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Remove `key` only if its live value equals `expected`.
    ///
    /// Implementations must perform the read, comparison and removal as one
    /// atomic step: when several callers race with the matching value,
    /// exactly one observes [`CompareAndDelete::Deleted`].
    async fn compare_and_delete(&self, key: &str, expected: &str) -> CacheResult<CompareAndDelete>;
}
