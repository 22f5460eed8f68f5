use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use super::MemoryCache;

const INITIAL_CAPACITY: usize = 512;

/// Cache that forgets half of its entries on every sweep.
///
/// Entries are kept until [`reduce_memory`](MemoryCache::reduce_memory)
/// runs, which walks the table once and drops every other entry in
/// iteration order. Which entries survive is unspecified; this is not an
/// LRU.
pub struct ThanosCache<K, V> {
    table: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for ThanosCache<K, V> {
    fn default() -> Self {
        Self {
            table: RwLock::new(HashMap::with_capacity(INITIAL_CAPACITY)),
        }
    }
}

impl<K, V> ThanosCache<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl<K, V> MemoryCache<K, V> for ThanosCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.table.read().get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        self.table.write().insert(key, value);
    }

    fn reduce_memory(&self) -> usize {
        let mut table = self.table.write();
        let before = table.len();
        let mut finger = 0usize;
        table.retain(|_, _| {
            finger += 1;
            finger & 1 == 0
        });
        let removed = before - table.len();
        tracing::trace!(removed, remaining = table.len(), "cache sweep");
        removed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn filled(count: usize) -> ThanosCache<String, usize> {
        let cache = ThanosCache::new();
        for i in 0..count {
            cache.put(format!("key-{}", i), i);
        }
        cache
    }

    #[test]
    fn test_get_put_overwrite() {
        let cache = ThanosCache::new();
        assert_eq!(cache.get(&"moky"), None);
        cache.put("moky", 1);
        cache.put("moky", 2);
        assert_eq!(cache.get(&"moky"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reduce_memory_kills_half() {
        let cache = filled(101);
        let removed = cache.reduce_memory();
        // odd positions go: 1st, 3rd, ... 101st
        assert_eq!(removed, 51);
        assert_eq!(cache.len(), 50);

        assert_eq!(cache.reduce_memory(), 25);
        assert_eq!(cache.len(), 25);
    }

    #[test]
    fn test_survivors_unchanged() {
        let cache = filled(64);
        cache.reduce_memory();
        let mut survivors = 0;
        for i in 0..64 {
            if let Some(value) = cache.get(&format!("key-{}", i)) {
                assert_eq!(value, i);
                survivors += 1;
            }
        }
        assert_eq!(survivors, 32);
    }

    #[test]
    fn test_reduce_empty_and_single() {
        let cache: ThanosCache<String, usize> = ThanosCache::new();
        assert_eq!(cache.reduce_memory(), 0);

        let cache = filled(1);
        assert_eq!(cache.reduce_memory(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = std::sync::Arc::new(ThanosCache::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..250 {
                        cache.put(t * 1000 + i, i);
                        if i % 100 == 0 {
                            cache.reduce_memory();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 1000);
        for t in 0..4 {
            if let Some(value) = cache.get(&(t * 1000 + 249)) {
                assert_eq!(value, 249);
            }
        }
    }
}
