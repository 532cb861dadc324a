use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// Bounded map with least-recently-used eviction. `get` and `insert` touch
/// recency; `peek` and `contains` do not. Eviction is immediate and strictly
/// LRU, which the client pool relies on for its observable size guarantees.
pub struct LruCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    // Front is the least recently used key.
    order: VecDeque<K>,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.entries.contains_key(key) {
            return None;
        }
        self.touch(key);
        self.entries.get(key)
    }

    /// Inserts `value` under `key`, evicting the least recently used entry
    /// when at capacity. Returns the evicted key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), value);
            self.touch(&key);
            return None;
        }
        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            if let Some(lru) = self.order.pop_front() {
                self.entries.remove(&lru);
                evicted = Some(lru);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        evicted
    }

    fn touch<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(pos) = self.order.iter().position(|k| k.borrow() == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LruCache;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        assert!(cache.insert("a".to_string(), 1).is_none());
        assert!(cache.insert("b".to_string(), 2).is_none());
        assert_eq!(cache.insert("c".to_string(), 3), Some("a".to_string()));
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn get_refreshes_recency() {
        let mut cache = LruCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.insert("c".to_string(), 3), Some("b".to_string()));
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn peek_and_contains_do_not_touch() {
        let mut cache = LruCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert_eq!(cache.peek("a"), Some(&1));
        assert!(cache.contains("a"));
        // "a" is still the LRU entry.
        assert_eq!(cache.insert("c".to_string(), 3), Some("a".to_string()));
    }

    #[test]
    fn reinsert_updates_value_without_eviction() {
        let mut cache = LruCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        assert!(cache.insert("a".to_string(), 10).is_none());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek("a"), Some(&10));
        // "a" became most recent, so "b" goes next.
        assert_eq!(cache.insert("c".to_string(), 3), Some("b".to_string()));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut cache = LruCache::new(0);
        assert!(cache.insert("a".to_string(), 1).is_none());
        assert_eq!(cache.insert("b".to_string(), 2), Some("a".to_string()));
        assert_eq!(cache.len(), 1);
    }
}
