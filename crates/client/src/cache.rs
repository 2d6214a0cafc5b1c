//! Keyed cache for slow-changing reference data.
//!
//! Reads go through [`QueryCache::get_or_fetch`]; mutations invalidate by
//! key prefix so the next read refetches. The cache is cleared whenever the
//! session changes hands.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

pub const KEY_MEETING_ROOMS: &str = "meeting-rooms";
pub const KEY_DEPARTMENTS: &str = "departments";
pub const KEY_ROLES: &str = "roles";

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

pub struct QueryCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the fresh cached value for `key`, or run `fetch` and cache its
    /// success. Errors are returned as-is and never cached.
    ///
    /// Concurrent misses on the same key may each fetch.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            tracing::trace!(key, "Query cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                value: Arc::new(value.clone()),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }

    async fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.ttl {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Drop every entry whose key starts with `prefix`.
    pub async fn invalidate(&self, prefix: &str) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        tracing::debug!(prefix, removed = before - entries.len(), "Query cache invalidated");
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
