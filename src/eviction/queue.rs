use ::lru::LruCache;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::KeyValue;

/// Primary keys ordered from least recently used to most recently used
pub struct EvictionQueue {
    entries: LruCache<KeyValue, ()>,
}

impl EvictionQueue {
    pub fn new() -> Self {
        EvictionQueue {
            entries: LruCache::unbounded(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &KeyValue) -> bool {
        self.entries.contains(key)
    }

    /// Track a new key as most recently used
    pub fn add_new(&mut self, key: KeyValue) -> Result<()> {
        if self.entries.contains(&key) {
            return Err(Error::new(
                ErrorKind::DuplicateKey,
                format!("Key {} is already in the eviction queue", key),
            ));
        }
        self.entries.push(key, ());
        Ok(())
    }

    /// Mark a key as most recently used. Unknown keys are ignored.
    pub fn touch(&mut self, key: &KeyValue) {
        self.entries.promote(key);
    }

    pub fn try_remove(&mut self, key: &KeyValue) -> bool {
        self.entries.pop(key).is_some()
    }

    /// Remove and return up to `count` least recently used keys, oldest first
    pub fn pop_oldest(&mut self, count: usize) -> Vec<KeyValue> {
        let mut evicted = Vec::with_capacity(count.min(self.entries.len()));
        while evicted.len() < count {
            match self.entries.pop_lru() {
                Some((key, ())) => evicted.push(key),
                None => break,
            }
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for EvictionQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_and_touch() {
        let mut queue = EvictionQueue::new();
        for key in 0..5 {
            queue.add_new(KeyValue::from(key)).unwrap();
        }
        queue.touch(&KeyValue::from(0));
        queue.touch(&KeyValue::from(42));

        assert_eq!(queue.pop_oldest(2), vec![KeyValue::from(1), KeyValue::from(2)]);
        assert_eq!(queue.len(), 3);
        assert_eq!(
            queue.pop_oldest(10),
            vec![KeyValue::from(3), KeyValue::from(4), KeyValue::from(0)]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_add_new_rejects_present_key() {
        let mut queue = EvictionQueue::new();
        queue.add_new(KeyValue::from("a")).unwrap();
        let err = queue.add_new(KeyValue::from("a")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateKey);

        assert!(queue.try_remove(&KeyValue::from("a")));
        assert!(!queue.try_remove(&KeyValue::from("a")));
        queue.add_new(KeyValue::from("a")).unwrap();
    }
}
