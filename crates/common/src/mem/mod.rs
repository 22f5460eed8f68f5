//! In-process memoizing caches
//!
//! Caches here never expire entries on their own. Memory is reclaimed only
//! when the owner calls [`MemoryCache::reduce_memory`], typically in
//! response to memory pressure.

mod thanos;

pub use thanos::ThanosCache;

/// Key/value memo table shared across threads
pub trait MemoryCache<K, V>: Send + Sync {
    /// Cached value for `key`, if any
    fn get(&self, key: &K) -> Option<V>;

    /// Insert or overwrite the value for `key`
    fn put(&self, key: K, value: V);

    /// Drop part of the cache and return how many entries were removed
    fn reduce_memory(&self) -> usize;
}
