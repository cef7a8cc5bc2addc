//! Tests for [`MemoryCache`] and [`Fingerprint`].

use std::time::Duration;

use mimir::{CacheConfig, CacheEntry, CacheStore, Fingerprint, MemoryCache, Operation};

// =========================================================================
// Fingerprint
// =========================================================================

#[test]
fn fingerprint_is_deterministic() {
    let code = "function f(){}";
    assert_eq!(Fingerprint::analysis(code), Fingerprint::analysis(code));
    assert_eq!(
        Fingerprint::new(Operation::Refactor, code),
        Fingerprint::refactor(code)
    );
}

#[test]
fn fingerprint_separates_operations() {
    let code = "function f(){}";
    assert_ne!(Fingerprint::analysis(code), Fingerprint::refactor(code));
}

#[test]
fn fingerprint_is_whitespace_sensitive() {
    assert_ne!(
        Fingerprint::analysis("a = 1"),
        Fingerprint::analysis("a = 1\n")
    );
    assert_ne!(Fingerprint::analysis("a=1"), Fingerprint::analysis("a = 1"));
}

#[test]
fn fingerprint_format() {
    let key = Fingerprint::refactor("");
    // sha256 of the empty string
    assert_eq!(
        key.as_str(),
        "refactor:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(key.short(), "refactor:e3b0c44298fc");
}

// =========================================================================
// MemoryCache
// =========================================================================

#[tokio::test]
async fn miss_then_hit() {
    let cache = MemoryCache::new(&CacheConfig::default());
    let key = Fingerprint::analysis("hello");

    // Miss
    assert!(cache.get(&key).await.unwrap().is_none());

    // Insert
    cache
        .put(&key, "{\"style\":[]}".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    // Hit
    assert_eq!(
        cache.get(&key).await.unwrap().as_deref(),
        Some("{\"style\":[]}")
    );
}

#[tokio::test]
async fn operations_do_not_collide() {
    let cache = MemoryCache::default();
    cache
        .put(
            &Fingerprint::analysis("same"),
            "analysis".to_string(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    assert!(cache.get(&Fingerprint::refactor("same")).await.unwrap().is_none());
}

#[tokio::test]
async fn put_overwrites() {
    let cache = MemoryCache::default();
    let key = Fingerprint::analysis("x");
    cache.put(&key, "one".into(), Duration::from_secs(60)).await.unwrap();
    cache.put(&key, "two".into(), Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("two"));
}

#[tokio::test]
async fn ttl_expiry() {
    let cache = MemoryCache::default();
    let key = Fingerprint::analysis("text");

    cache
        .put(&key, "value".into(), Duration::from_millis(50))
        .await
        .unwrap();

    // Should be present immediately
    assert!(cache.get(&key).await.unwrap().is_some());

    // Wait for TTL + some margin
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Should be expired
    assert!(cache.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn ttl_is_per_entry() {
    let cache = MemoryCache::default();
    let short = Fingerprint::analysis("short");
    let long = Fingerprint::refactor("long");

    cache
        .put(&short, "a".into(), Duration::from_millis(50))
        .await
        .unwrap();
    cache
        .put(&long, "b".into(), Duration::from_secs(60))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(cache.get(&short).await.unwrap().is_none());
    assert_eq!(cache.get(&long).await.unwrap().as_deref(), Some("b"));
}

#[tokio::test]
async fn put_entry_uses_entry_ttl() {
    let cache = MemoryCache::default();
    let entry = CacheEntry::new(
        Fingerprint::analysis("x"),
        "payload".into(),
        Duration::from_secs(3600),
    );
    assert_eq!(entry.ttl_seconds, 3600);

    cache.put_entry(entry.clone()).await.unwrap();
    assert_eq!(
        cache.get(&entry.fingerprint).await.unwrap().as_deref(),
        Some("payload")
    );
}

#[tokio::test]
async fn clear_evicts_everything() {
    let cache = MemoryCache::default();
    let key = Fingerprint::analysis("x");
    cache.put(&key, "v".into(), Duration::from_secs(60)).await.unwrap();
    cache.clear();
    assert!(cache.get(&key).await.unwrap().is_none());
}
