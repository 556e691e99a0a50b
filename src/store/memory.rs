//! In-process challenge store.
//!
//! A `RwLock`'d map of encoded entries with per-entry expiry. This is the
//! deployment-default backend; a networked cache implements the same trait
//! with the same key and value layout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ChallengeRecord, ChallengeStore};
use crate::Result;

struct StoredEntry {
    value: String,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Thread-safe in-memory challenge store with TTL semantics.
pub struct MemoryChallengeStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryChallengeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|e| !e.is_expired()).count()
    }

    /// True when no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops entries whose TTL has lapsed. Expired entries already behave as
    /// absent; this only reclaims memory and is run periodically by the
    /// server binary.
    pub async fn cleanup_expired(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired());
    }
}

impl Default for MemoryChallengeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn put(&self, challenge_id: &str, record: &ChallengeRecord, ttl: Duration) -> Result<()> {
        let entry = StoredEntry {
            value: record.encode(),
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(ChallengeRecord::key(challenge_id), entry);
        Ok(())
    }

    async fn get(&self, challenge_id: &str) -> Result<Option<ChallengeRecord>> {
        let entries = self.entries.read().await;
        match entries.get(&ChallengeRecord::key(challenge_id)) {
            Some(entry) if !entry.is_expired() => ChallengeRecord::decode(&entry.value).map(Some),
            _ => Ok(None),
        }
    }

    async fn delete(&self, challenge_id: &str) -> Result<bool> {
        // Removal under the write lock is the linearization point for
        // challenge consumption: at most one caller sees `true`.
        let mut entries = self.entries.write().await;
        match entries.remove(&ChallengeRecord::key(challenge_id)) {
            Some(entry) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }
}
