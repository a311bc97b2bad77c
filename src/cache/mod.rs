//! Time-bounded read-through cache.
//!
//! Entries are valid while `now - stored_at < ttl`. Expired entries are
//! treated as misses and dropped when read; nothing purges them in the
//! background. Each `get`/`set` takes the lock once, so concurrent callers
//! see last-writer-wins semantics per key.

use std::collections::HashMap;
use std::future::Future;
#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Source of the current time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The stored value if it is younger than the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let fresh = match entries.get(key) {
            Some(entry) => now.saturating_duration_since(entry.stored_at) < self.ttl,
            None => return None,
        };

        if fresh {
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    /// Store `value`, replacing any earlier entry for `key`.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = Entry {
            value,
            stored_at: self.clock.now(),
        };
        self.lock().insert(key.into(), entry);
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Serve `key` from the cache or run `load` and cache its success.
    ///
    /// Errors are returned to the caller and never cached. The lock is not
    /// held across the load, so concurrent misses may both load.
    pub async fn get_or_load<E, F, Fut>(&self, key: &str, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(key) {
            tracing::trace!(key, "cache hit");
            return Ok(hit);
        }

        tracing::trace!(key, "cache miss");
        let value = load().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cache key builders. Every parameter that changes a result is part of its key.
pub mod keys {
    pub fn published_page(limit: u32, offset: u32) -> String {
        format!("posts:published:limit={limit}:offset={offset}")
    }

    pub fn latest(limit: u32) -> String {
        format!("posts:latest:limit={limit}")
    }

    pub fn post_slug(slug: &str) -> String {
        format!("post:slug:{slug}")
    }

    pub fn post_id(id: &str) -> String {
        format!("post:id:{id}")
    }

    pub fn posts_ids(ids: &[String]) -> String {
        format!("posts:ids:{}", ids.join(","))
    }

    pub fn posts_tag(tag: &str, limit: u32) -> String {
        format!("posts:tag:{tag}:limit={limit}")
    }

    pub fn apps() -> String {
        "apps:all".to_string()
    }

    pub fn profile() -> String {
        "profile".to_string()
    }
}
