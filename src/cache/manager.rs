use crate::cache::store::CacheStore;
use crate::errors::PonteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A cached provider response plus the bookkeeping needed for
/// popularity-aware eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub response: String,
    pub original_message: String,
    pub conversation_key: Option<String>,
    pub cached_at: DateTime<Utc>,
    /// Hit count at read time; the live counter lives under its own key with
    /// a TTL twice the entry's, so popularity outlives individual entries.
    pub popularity: i64,
}

/// Popularity-aware response cache over a TTL key/value store.
///
/// The cache is an optimization, never a correctness dependency: any store
/// failure degrades to cache-disabled behavior (lookups miss, writes no-op)
/// and is logged rather than propagated.
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
    enabled: bool,
    prefix: String,
    ttl: Duration,
    max_entries: usize,
}

impl CacheManager {
    pub fn new(
        store: Arc<dyn CacheStore>,
        enabled: bool,
        prefix: String,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        Self {
            store,
            enabled,
            prefix,
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Canonical form used for key derivation: trimmed, lower-cased,
    /// whitespace runs collapsed to single spaces.
    pub(crate) fn normalize_text(text: &str) -> String {
        text.trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn content_hash(input: &str) -> String {
        hex::encode(Sha256::digest(input.as_bytes()))
    }

    /// Content+scope key a response is stored under.
    pub(crate) fn response_key(&self, text: &str, scope: Option<&str>) -> String {
        let normalized = Self::normalize_text(text);
        let salted = match scope {
            Some(s) => format!("{}_{}", normalized, s),
            None => normalized,
        };
        format!("{}:response:{}", self.prefix, Self::content_hash(&salted))
    }

    /// Content-only key the popularity counter lives under, independent of
    /// any session scope.
    pub(crate) fn popularity_key(&self, text: &str) -> String {
        let normalized = Self::normalize_text(text);
        format!(
            "{}:popularity:{}",
            self.prefix,
            Self::content_hash(&normalized)
        )
    }

    /// Look up a cached response. On a hit the popularity counter is bumped
    /// best-effort; a failed bump never fails the lookup.
    pub async fn get(&self, text: &str, scope: Option<&str>) -> Option<CacheEntry> {
        if !self.enabled {
            return None;
        }

        let key = self.response_key(text, scope);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                let err = PonteError::CacheUnavailable(e.to_string());
                warn!("treating lookup as a miss: {}", err);
                return None;
            }
        };

        let mut entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("unreadable cache entry under {}, dropping it: {}", key, e);
                let _ = self.store.delete(&key).await;
                return None;
            }
        };

        match self.store.incr(&self.popularity_key(text)).await {
            Ok(count) => entry.popularity = count,
            Err(e) => warn!("popularity increment failed (ignored): {}", e),
        }

        debug!("cache hit for {} (popularity {})", key, entry.popularity);
        Some(entry)
    }

    /// Store a response under the content+scope key, seed the popularity
    /// counter (zero hits so far) if absent, then run a cleanup pass.
    pub async fn put(&self, text: &str, response: &str, scope: Option<&str>) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry {
            response: response.to_string(),
            original_message: text.to_string(),
            conversation_key: scope.map(str::to_string),
            cached_at: Utc::now(),
            popularity: 0,
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("failed to serialize cache entry: {}", e);
                return;
            }
        };

        let key = self.response_key(text, scope);
        if let Err(e) = self.store.set_ex(&key, &raw, Some(self.ttl)).await {
            let err = PonteError::CacheUnavailable(e.to_string());
            warn!("dropping cache write: {}", err);
            return;
        }

        let pop_key = self.popularity_key(text);
        match self.store.exists(&pop_key).await {
            Ok(false) => {
                if let Err(e) = self.store.set_ex(&pop_key, "0", Some(self.ttl * 2)).await {
                    warn!("popularity seed failed (ignored): {}", e);
                }
            }
            Ok(true) => {}
            Err(e) => warn!("popularity probe failed (ignored): {}", e),
        }

        self.cleanup().await;
    }

    /// Evict least-popular entries once the entry count exceeds the cap.
    /// Approximate housekeeping: failures are logged and skipped, exactness
    /// is not required, only that growth stays bounded.
    pub async fn cleanup(&self) {
        let response_prefix = format!("{}:response:", self.prefix);
        let keys = match self.store.scan_prefix(&response_prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                let err = PonteError::CacheUnavailable(e.to_string());
                warn!("skipping cleanup pass: {}", err);
                return;
            }
        };
        if keys.len() <= self.max_entries {
            return;
        }
        let excess = keys.len() - self.max_entries;

        let mut scored: Vec<(String, i64)> = Vec::with_capacity(keys.len());
        for key in keys {
            let popularity = match self.store.get(&key).await {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                    Ok(entry) => self
                        .store
                        .get(&self.popularity_key(&entry.original_message))
                        .await
                        .ok()
                        .flatten()
                        .and_then(|v| v.parse::<i64>().ok())
                        .unwrap_or(0),
                    // Unreadable entries are the first to go.
                    Err(_) => i64::MIN,
                },
                _ => i64::MIN,
            };
            scored.push((key, popularity));
        }

        scored.sort_by_key(|(_, p)| *p);
        for (key, popularity) in scored.into_iter().take(excess) {
            debug!("evicting cache entry {} (popularity {})", key, popularity);
            if let Err(e) = self.store.delete(&key).await {
                warn!("cache eviction of {} failed (ignored): {}", key, e);
            }
        }
    }
}
