use anyhow::Result;
use async_trait::async_trait;
use moka::sync::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// TTL-capable key/value collaborator behind the response cache.
///
/// The surface mirrors the small slice of a Redis-style store the cache
/// manager needs; `MemoryCacheStore` is the in-process default, and a
/// networked backend can slot in for multi-process deployments.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a value with an optional expiry. `None` means no expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Increment an integer counter, creating it at 1 if absent. Keeps the
    /// key's TTL behavior (a fresh counter has no expiry until one is set).
    async fn incr(&self, key: &str) -> Result<i64>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// All live keys starting with `prefix`.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

#[derive(Clone)]
struct Stored {
    value: String,
    ttl: Option<Duration>,
}

struct PerEntryExpiry;

impl Expiry<String, Stored> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    // Updates refresh the entry's full TTL (counter bumps keep popularity alive).
    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-process TTL store built on moka. Capacity is unbounded here; the cache
/// manager enforces the entry cap with popularity-aware eviction instead of
/// moka's own policy.
pub struct MemoryCacheStore {
    inner: Cache<String, Stored>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().expire_after(PerEntryExpiry).build(),
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get(key).map(|s| s.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.inner.insert(
            key.to_string(),
            Stored {
                value: value.to_string(),
                ttl,
            },
        );
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let current = self.inner.get(key);
        let next = current
            .as_ref()
            .and_then(|s| s.value.parse::<i64>().ok())
            .unwrap_or(0)
            + 1;
        let ttl = current.and_then(|s| s.ttl);
        self.inner.insert(
            key.to_string(),
            Stored {
                value: next.to_string(),
                ttl,
            },
        );
        Ok(next)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.inner.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.inner.invalidate(key);
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.inner.run_pending_tasks();
        Ok(self
            .inner
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.as_ref().clone())
            .collect())
    }
}
