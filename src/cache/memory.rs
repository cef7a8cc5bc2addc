//! In-process cache backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use super::{CacheConfig, CacheStore, Fingerprint};
use crate::Result;

/// Stored value together with the TTL it was written with.
#[derive(Clone)]
struct StoredPayload {
    payload: String,
    ttl: Duration,
}

/// Expire each entry after the TTL it was inserted with. Overwrites restart
/// the clock with the new entry's TTL.
struct PerEntryTtl;

impl Expiry<String, StoredPayload> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &StoredPayload,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &StoredPayload,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory result cache.
///
/// Bounded LRU (moka) with per-entry expiry, so analysis and refactor
/// entries can carry different TTLs in one store. Owned per process;
/// clones of an `Arc<MemoryCache>` share entries.
pub struct MemoryCache {
    entries: Cache<String, StoredPayload>,
}

impl MemoryCache {
    /// Create a cache bounded by `config.max_entries`.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(PerEntryTtl)
            .build();
        Self { entries }
    }

    /// Number of live entries (approximate until pending tasks run).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &Fingerprint) -> Result<Option<String>> {
        Ok(self
            .entries
            .get(key.as_str())
            .await
            .map(|stored| stored.payload))
    }

    async fn put(&self, key: &Fingerprint, payload: String, ttl: Duration) -> Result<()> {
        self.entries
            .insert(key.as_str().to_string(), StoredPayload { payload, ttl })
            .await;
        Ok(())
    }
}
