//! Result cache.
//!
//! The reviewer memoizes extracted results under a [`Fingerprint`] of
//! (operation, code) so identical submissions never reach a provider twice
//! within the TTL.
//!
//! Storage sits behind the [`CacheStore`] trait. [`MemoryCache`] is the
//! in-process implementation (moka, per-entry TTL). With the `redis`
//! feature, `RedisCache` stores entries on a redis server so several
//! processes share them and they survive restarts; fingerprints are
//! stable across processes, so keys written by one instance are readable
//! by another.
//!
//! The store has plain overwrite semantics. Which result wins when two
//! requests race on the same fingerprint is decided by the reviewer, not
//! here.

mod fingerprint;
mod memory;
#[cfg(feature = "redis")]
mod redis_backend;

pub use fingerprint::Fingerprint;
pub use memory::MemoryCache;
#[cfg(feature = "redis")]
pub use redis_backend::RedisCache;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::Operation;

/// Default entry lifetime for both operation kinds: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the result cache.
///
/// ```rust
/// # use mimir::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(5_000)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Lifetime of analysis results. Default: 24 hours.
    pub analysis_ttl: Duration,
    /// Lifetime of refactor results. Default: 24 hours.
    pub refactor_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            analysis_ttl: DEFAULT_TTL,
            refactor_ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the same TTL for both operation kinds.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.analysis_ttl = ttl;
        self.refactor_ttl = ttl;
        self
    }

    pub fn analysis_ttl(mut self, ttl: Duration) -> Self {
        self.analysis_ttl = ttl;
        self
    }

    pub fn refactor_ttl(mut self, ttl: Duration) -> Self {
        self.refactor_ttl = ttl;
        self
    }

    /// TTL for entries produced by `operation`.
    pub fn ttl_for(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Analysis => self.analysis_ttl,
            Operation::Refactor => self.refactor_ttl,
        }
    }
}

/// One persisted cache entry: a fingerprint, the JSON-serialized result,
/// and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub payload: String,
    pub ttl_seconds: u64,
}

impl CacheEntry {
    pub fn new(fingerprint: Fingerprint, payload: String, ttl: Duration) -> Self {
        Self {
            fingerprint,
            payload,
            ttl_seconds: ttl.as_secs(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Key/value storage with expiry.
///
/// Expired entries must be indistinguishable from absent ones on `get`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Look up the serialized payload stored under `key`.
    async fn get(&self, key: &Fingerprint) -> Result<Option<String>>;

    /// Store `payload` under `key` for `ttl`, replacing any existing entry.
    async fn put(&self, key: &Fingerprint, payload: String, ttl: Duration) -> Result<()>;

    /// Store a [`CacheEntry`].
    async fn put_entry(&self, entry: CacheEntry) -> Result<()> {
        let ttl = entry.ttl();
        self.put(&entry.fingerprint, entry.payload, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_one_day() {
        let config = CacheConfig::default();
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.ttl_for(Operation::Analysis), DEFAULT_TTL);
        assert_eq!(config.ttl_for(Operation::Refactor), DEFAULT_TTL);
        assert_eq!(DEFAULT_TTL.as_secs(), 86_400);
    }

    #[test]
    fn per_operation_ttl() {
        let config = CacheConfig::new()
            .analysis_ttl(Duration::from_secs(10))
            .refactor_ttl(Duration::from_secs(20));
        assert_eq!(config.ttl_for(Operation::Analysis), Duration::from_secs(10));
        assert_eq!(config.ttl_for(Operation::Refactor), Duration::from_secs(20));
    }

    #[test]
    fn entry_serializes_with_ttl_seconds() {
        let entry = CacheEntry::new(
            Fingerprint::analysis("x"),
            "{}".to_string(),
            Duration::from_secs(60),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["ttl_seconds"], 60);
        assert_eq!(json["payload"], "{}");
        assert!(json["fingerprint"].as_str().unwrap().starts_with("analysis:"));
    }
}
