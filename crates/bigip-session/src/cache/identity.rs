//! Weak identity map from [`ResourceKey`] to a single live proxy.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::key::ResourceKey;

/// Identity cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Misses that found a dead entry and replaced it.
    pub replaced: u64,
    pub rekeys: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Inner<T> {
    entries: HashMap<ResourceKey, Weak<T>>,
    stats: CacheStats,
}

/// Weak, identity-mapped proxy cache.
///
/// The cache never owns a proxy: callers hold the `Arc`, the cache holds a `Weak`.
/// Once the last caller drops its handle the entry is dead, and the next lookup
/// builds a fresh proxy in its place.
///
/// All operations run under one mutex, so the cache can be shared between
/// connections and threads. Factories run while the lock is held and must not
/// touch the cache themselves.
pub struct IdentityCache<T> {
    inner: Mutex<Inner<T>>,
}

impl<T> std::fmt::Debug for IdentityCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("IdentityCache")
            .field("entry_count", &inner.entries.len())
            .field("stats", &inner.stats)
            .finish_non_exhaustive()
    }
}

impl<T> Default for IdentityCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IdentityCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Return the live proxy for `key`, or build one with `factory` and cache it.
    pub fn lookup_or_create<F>(&self, key: ResourceKey, factory: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let mut inner = self.inner.lock();

        let dead = match inner.entries.get(&key) {
            Some(weak) => {
                if let Some(proxy) = weak.upgrade() {
                    inner.stats.hits += 1;
                    tracing::trace!(cache.result = "hit", cache.key = %key);
                    return proxy;
                }
                true
            }
            None => false,
        };

        inner.stats.misses += 1;
        if dead {
            inner.stats.replaced += 1;
        }
        tracing::trace!(cache.result = "miss", cache.key = %key, cache.replaced = dead);

        let proxy = Arc::new(factory());
        inner.entries.insert(key, Arc::downgrade(&proxy));
        proxy
    }

    /// Live proxy for `key`, without creating one.
    pub fn get(&self, key: &ResourceKey) -> Option<Arc<T>> {
        self.inner.lock().entries.get(key).and_then(Weak::upgrade)
    }

    /// Register `proxy` under `key`, returning a different live proxy it displaced.
    pub fn insert(&self, key: ResourceKey, proxy: &Arc<T>) -> Option<Arc<T>> {
        let mut inner = self.inner.lock();
        inner
            .entries
            .insert(key, Arc::downgrade(proxy))
            .and_then(|old| old.upgrade())
            .filter(|old| !Arc::ptr_eq(old, proxy))
    }

    /// Move `proxy` from `old` to `new` in one step.
    ///
    /// The `old` entry is only removed when it refers to `proxy` (or is dead), so a
    /// stale rekey cannot evict an unrelated proxy. If another live proxy already
    /// holds `new`, nothing changes and that proxy is returned as the error.
    pub fn rekey(
        &self,
        old: &ResourceKey,
        new: ResourceKey,
        proxy: &Arc<T>,
    ) -> std::result::Result<(), Arc<T>> {
        let mut inner = self.inner.lock();

        let holder = inner
            .entries
            .get(&new)
            .and_then(Weak::upgrade)
            .filter(|other| !Arc::ptr_eq(other, proxy));
        if let Some(holder) = holder {
            drop(inner);
            tracing::warn!(
                cache.old_key = %old,
                cache.new_key = %new,
                "Rekey target held by another live proxy"
            );
            return Err(holder);
        }

        if Self::owned_by(&inner.entries, old, proxy) {
            inner.entries.remove(old);
        }
        inner.stats.rekeys += 1;
        tracing::debug!(cache.old_key = %old, cache.new_key = %new, "Rekeying cached proxy");
        inner.entries.insert(new, Arc::downgrade(proxy));
        Ok(())
    }

    /// Evict `key`. Returns whether an entry was present.
    pub fn forget(&self, key: &ResourceKey) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.stats.evictions += 1;
            tracing::debug!(cache.key = %key, "Evicted cached proxy");
        }
        removed
    }

    /// Evict `key` only if it refers to `proxy` or to a dead proxy.
    ///
    /// Returns whether an entry was removed. A live entry owned by another proxy
    /// is left alone.
    pub fn forget_if(&self, key: &ResourceKey, proxy: &T) -> bool {
        let mut inner = self.inner.lock();
        let owned = inner.entries.get(key).is_some_and(|weak| {
            weak.upgrade()
                .is_none_or(|p| std::ptr::eq(Arc::as_ptr(&p), proxy))
        });
        if owned {
            inner.entries.remove(key);
            inner.stats.evictions += 1;
            tracing::debug!(cache.key = %key, "Evicted cached proxy");
        } else {
            tracing::trace!(cache.key = %key, "Entry owned by another proxy, not evicted");
        }
        owned
    }

    fn owned_by(
        entries: &HashMap<ResourceKey, Weak<T>>,
        key: &ResourceKey,
        proxy: &Arc<T>,
    ) -> bool {
        entries
            .get(key)
            .is_some_and(|weak| weak.upgrade().is_none_or(|p| Arc::ptr_eq(&p, proxy)))
    }

    /// Drop dead entries. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, weak| weak.strong_count() > 0);
        before - inner.entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .entries
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats = CacheStats::default();
    }
}
