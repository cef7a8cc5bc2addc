//! Shared cache backend on redis.
//!
//! Entries are written with `SET key payload EX ttl` and read with `GET`,
//! so expiry is enforced by the server and every process pointed at the
//! same instance shares results. Keys are `"{prefix}:{fingerprint}"`.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{CacheStore, Fingerprint};
use crate::{MimirError, Result};

/// Key prefix used unless one is given.
pub const DEFAULT_PREFIX: &str = "mimir";

/// Time allowed for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed result cache.
///
/// Connects lazily on first use and keeps one multiplexed connection. A
/// failed command drops the connection so the next call reconnects.
pub struct RedisCache {
    client: redis::Client,
    prefix: String,
    connect_timeout: Duration,
    connection: Mutex<Option<MultiplexedConnection>>,
}

impl RedisCache {
    /// Create a cache for the server at `url` (`redis://host:port/db`).
    ///
    /// Only the URL is validated here; no connection is made.
    pub fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| MimirError::Configuration(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            prefix: DEFAULT_PREFIX.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            connection: Mutex::new(None),
        })
    }

    /// Namespace keys under `prefix` instead of `"mimir"`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The redis key `fingerprint` is stored under.
    pub fn key(&self, fingerprint: &Fingerprint) -> String {
        format!("{}:{}", self.prefix, fingerprint)
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        debug!("connecting to redis");
        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| MimirError::Cache("redis connect timed out".to_string()))?
        .map_err(cache_error)?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn reset(&self, error: &redis::RedisError) {
        warn!(error = %error, "redis command failed, dropping connection");
        self.connection.lock().await.take();
    }
}

fn cache_error(error: redis::RedisError) -> MimirError {
    MimirError::Cache(format!("redis: {error}"))
}

#[async_trait]
impl CacheStore for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &Fingerprint) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        let found: redis::RedisResult<Option<String>> = conn.get(self.key(key)).await;
        match found {
            Ok(payload) => Ok(payload),
            Err(e) => {
                self.reset(&e).await;
                Err(cache_error(e))
            }
        }
    }

    async fn put(&self, key: &Fingerprint, payload: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        // EX rejects zero.
        let seconds = ttl.as_secs().max(1);
        let written: redis::RedisResult<()> = conn.set_ex(self.key(key), payload, seconds).await;
        match written {
            Ok(()) => Ok(()),
            Err(e) => {
                self.reset(&e).await;
                Err(cache_error(e))
            }
        }
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_prefixed_fingerprints() {
        let cache = RedisCache::new("redis://127.0.0.1:6379").unwrap();
        let fp = Fingerprint::analysis("x");
        assert_eq!(cache.key(&fp), format!("mimir:{fp}"));

        let cache = cache.with_prefix("team-a");
        assert!(cache.key(&fp).starts_with("team-a:analysis:"));
    }

    #[test]
    fn invalid_url_is_a_configuration_error() {
        let err = RedisCache::new("not a url").unwrap_err();
        assert!(matches!(err, MimirError::Configuration(_)));
    }
}
