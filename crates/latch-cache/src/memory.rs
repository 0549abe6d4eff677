//! In-process store backed by a concurrent map
//!
//! Suitable for single-instance deployments and tests. Deadlines use the
//! tokio clock, so paused-time tests can step over TTL boundaries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use subtle::ConstantTimeEq;
use tokio::time::Instant;

use crate::error::CacheResult;
use crate::store::{CompareAndDelete, KeyValueStore};

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    expires_at: Instant,
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory [`KeyValueStore`]
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let found = self
            .entries
            .get(key)
            .map(|slot| (slot.is_expired(now), slot.value.clone()));

        match found {
            Some((false, value)) => Ok(Some(value)),
            Some((true, _)) => {
                self.entries.remove_if(key, |_, slot| slot.is_expired(now));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, slot)| !slot.is_expired(now)))
    }

    async fn compare_and_delete(&self, key: &str, expected: &str) -> CacheResult<CompareAndDelete> {
        let now = Instant::now();

        // The entry guard holds the shard write lock for the whole check.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.remove();
                    return Ok(CompareAndDelete::Absent);
                }

                let matches: bool = occupied
                    .get()
                    .value
                    .as_bytes()
                    .ct_eq(expected.as_bytes())
                    .into();

                if matches {
                    occupied.remove();
                    Ok(CompareAndDelete::Deleted)
                } else {
                    Ok(CompareAndDelete::Mismatch)
                }
            }
            Entry::Vacant(_) => Ok(CompareAndDelete::Absent),
        }
    }
}
