//! Thread-safe TTL cache for report results.
//!
//! One exclusive lock guards every operation, reads included. Entries expire
//! lazily: an expired entry is dropped by the `get` that finds it and counts
//! as a miss. When the cache is full, `set` evicts the oldest-inserted entry
//! (insertion order, not recency of use).

use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::models::{FilterSet, TimeWindow};

/// Default maximum number of entries.
pub const DEFAULT_MAX_ENTRIES: usize = 512;

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` before the first lookup.
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Option<Instant>,
    /// Insertion sequence number; matches the queue entry that owns it.
    seq: u64,
}

#[derive(Debug)]
struct CacheInner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Insertion order. Stale items (deleted or overwritten keys) are skipped
    /// during eviction by comparing sequence numbers.
    order: VecDeque<(u64, String)>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl<V> CacheInner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            next_seq: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn evict_oldest(&mut self) -> Option<String> {
        while let Some((seq, key)) = self.order.pop_front() {
            let live = self.entries.get(&key).is_some_and(|entry| entry.seq == seq);
            if live {
                self.entries.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// Drop queue items whose entries are gone once they dominate the queue.
    fn compact_order(&mut self) {
        if self.order.len() > self.entries.len() * 2 + 16 {
            let entries = &self.entries;
            self.order
                .retain(|(seq, key)| entries.get(key).is_some_and(|entry| entry.seq == *seq));
        }
    }
}

/// Key → value store with per-entry TTL and a size cap.
///
/// Values are cloned out on `get`; callers mutating what they get back do not
/// change the cached copy. Share the cache across requests behind an `Arc`.
pub struct TtlCache<V> {
    inner: Mutex<CacheInner<V>>,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Cache on the system clock. `max_entries` is raised to at least one.
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CacheInner::new()),
            max_entries: max_entries.max(1),
            clock,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Look up `key`, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => entry.expires_at.is_some_and(|at| now >= at),
        };

        if expired {
            inner.entries.remove(key);
            inner.misses += 1;
            debug!("cache entry expired: {}", key);
            return None;
        }

        inner.hits += 1;
        inner.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Store `value` under `key`. A zero `ttl` never expires.
    ///
    /// Overwriting a key counts as a fresh insertion for eviction order.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let expires_at = if ttl.is_zero() {
            None
        } else {
            self.clock.now().checked_add(ttl)
        };

        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            if let Some(evicted) = inner.evict_oldest() {
                debug!("cache full, evicted {}", evicted);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.push_back((seq, key.clone()));
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at,
                seq,
            },
        );
        inner.compact_order();
    }

    /// Remove `key`. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(key).is_some();
        inner.compact_order();
        removed
    }

    /// Remove every key starting with `prefix`. Returns how many were removed.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - inner.entries.len();
        inner.compact_order();
        removed
    }

    /// Remove every entry. Counters are kept. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let removed = inner.entries.len();
        inner.entries.clear();
        inner.order.clear();
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let lookups = inner.hits + inner.misses;
        CacheStats {
            size: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                inner.hits as f64 / lookups as f64
            },
        }
    }
}

/// Cache key for one report operation.
///
/// A compact JSON array: the `scope` parts (operation, metric, ...), the
/// window bounds, then the department and doctor lists in sorted order with
/// `null` for "no filter". Every component is a quoted JSON value, so
/// separators inside names cannot make two requests share a key. Every call
/// site builds keys here so equal requests always map to the same entry.
pub fn cache_key(scope: &[&str], window: &TimeWindow, filters: &FilterSet) -> String {
    format!(
        "{}{},{},{},{}]",
        cache_key_prefix(scope),
        Value::from(window.start().to_string()),
        Value::from(window.end().to_string()),
        filter_list(filters.departments()),
        filter_list(filters.doctors())
    )
}

/// Prefix shared by every [`cache_key`] built with `scope`, for
/// [`TtlCache::delete_prefix`].
pub fn cache_key_prefix(scope: &[&str]) -> String {
    let mut prefix = String::from("[");
    for part in scope {
        prefix.push_str(&Value::from(*part).to_string());
        prefix.push(',');
    }
    prefix
}

fn filter_list(set: Option<&BTreeSet<String>>) -> Value {
    match set {
        None => Value::Null,
        Some(items) => items.iter().map(|item| Value::from(item.as_str())).collect(),
    }
}
