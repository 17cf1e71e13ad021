use parking_lot::Mutex;
use crate::core::error::Result;
use crate::core::types::KeyValue;
use crate::eviction::queue::EvictionQueue;

/// Least-recently-used eviction.
///
/// Eviction is required once more than `limit` items are tracked. An
/// eviction removes enough of the oldest items to fall `eviction_count` below
/// the limit, so evictions happen in batches instead of on every insert.
pub struct LruEvictionPolicy {
    limit: usize,
    eviction_count: usize,
    queue: Mutex<EvictionQueue>,
}

impl LruEvictionPolicy {
    pub fn new(limit: usize, eviction_count: usize) -> Self {
        LruEvictionPolicy {
            limit,
            eviction_count,
            queue: Mutex::new(EvictionQueue::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn eviction_count(&self) -> usize {
        self.eviction_count
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn add_item(&self, key: KeyValue) -> Result<()> {
        self.queue.lock().add_new(key)
    }

    pub fn touch(&self, key: &KeyValue) {
        self.queue.lock().touch(key);
    }

    pub fn try_remove(&self, key: &KeyValue) -> bool {
        self.queue.lock().try_remove(key)
    }

    pub fn is_eviction_required(&self) -> bool {
        self.queue.lock().len() > self.limit
    }

    /// Also trims a queue sitting exactly at the limit when called directly
    pub fn do_eviction(&self) -> Vec<KeyValue> {
        let mut queue = self.queue.lock();
        let tracked = queue.len();
        if tracked < self.limit {
            return Vec::new();
        }
        let to_remove = (tracked - self.limit + self.eviction_count).min(tracked);
        queue.pop_oldest(to_remove)
    }

    pub fn clear(&self) {
        self.queue.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_eviction_keeps_touched_items() {
        let policy = LruEvictionPolicy::new(10, 2);
        for key in 0..100 {
            policy.add_item(KeyValue::from(key)).unwrap();
        }
        assert!(policy.is_eviction_required());

        let evicted = policy.do_eviction();
        assert_eq!(evicted.len(), 92);
        assert_eq!(evicted, (0..92).map(KeyValue::from).collect::<Vec<_>>());
        assert_eq!(policy.len(), 8);

        policy.touch(&KeyValue::from(93));
        policy.add_item(KeyValue::from(100)).unwrap();
        policy.add_item(KeyValue::from(101)).unwrap();
        assert!(!policy.is_eviction_required());

        let evicted = policy.do_eviction();
        assert_eq!(evicted, vec![KeyValue::from(92), KeyValue::from(94)]);
        assert_eq!(policy.len(), 8);
    }

    #[test]
    fn test_required_only_above_limit() {
        let policy = LruEvictionPolicy::new(5, 2);
        for key in 0..5 {
            policy.add_item(KeyValue::from(key)).unwrap();
        }
        assert!(!policy.is_eviction_required());

        policy.add_item(KeyValue::from(5)).unwrap();
        assert!(policy.is_eviction_required());
        assert_eq!(policy.do_eviction(), vec![KeyValue::from(0), KeyValue::from(1), KeyValue::from(2)]);
        assert_eq!(policy.len(), 3);
    }

    #[test]
    fn test_below_limit_nothing_happens() {
        let policy = LruEvictionPolicy::new(5, 1);
        for key in 0..4 {
            policy.add_item(KeyValue::from(key)).unwrap();
        }
        assert!(!policy.is_eviction_required());
        assert!(policy.do_eviction().is_empty());

        assert!(policy.try_remove(&KeyValue::from(0)));
        assert_eq!(policy.len(), 3);
    }
}
