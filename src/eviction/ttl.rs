use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use parking_lot::Mutex;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::KeyValue;

#[derive(Default)]
struct TtlState {
    // insertion order; entries whose key was removed or re-added go stale
    queue: VecDeque<(KeyValue, Instant)>,
    live: HashMap<KeyValue, Instant>,
}

impl TtlState {
    fn is_live(&self, key: &KeyValue, expiry: Instant) -> bool {
        self.live.get(key) == Some(&expiry)
    }

    fn drop_stale_front(&mut self) {
        while let Some((key, expiry)) = self.queue.front() {
            if self.is_live(key, *expiry) {
                break;
            }
            self.queue.pop_front();
        }
    }
}

/// Time-to-live eviction: an item expires a fixed time after insertion.
/// Reads do not extend its life.
pub struct TtlEvictionPolicy {
    time_to_live: Duration,
    state: Mutex<TtlState>,
}

impl TtlEvictionPolicy {
    pub fn new(time_to_live: Duration) -> Self {
        TtlEvictionPolicy {
            time_to_live,
            state: Mutex::new(TtlState::default()),
        }
    }

    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    pub fn len(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().live.is_empty()
    }

    pub fn add_item(&self, key: KeyValue) -> Result<()> {
        self.add_item_at(key, Instant::now())
    }

    pub fn add_item_at(&self, key: KeyValue, now: Instant) -> Result<()> {
        let mut state = self.state.lock();
        if state.live.contains_key(&key) {
            return Err(Error::new(
                ErrorKind::DuplicateKey,
                format!("Key {} is already tracked for expiry", key),
            ));
        }
        let expiry = now + self.time_to_live;
        state.live.insert(key.clone(), expiry);
        state.queue.push_back((key, expiry));
        Ok(())
    }

    pub fn try_remove(&self, key: &KeyValue) -> bool {
        self.state.lock().live.remove(key).is_some()
    }

    pub fn is_eviction_required(&self) -> bool {
        self.is_eviction_required_at(Instant::now())
    }

    pub fn is_eviction_required_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        state.drop_stale_front();
        state.queue.front().is_some_and(|(_, expiry)| *expiry <= now)
    }

    pub fn do_eviction(&self) -> Vec<KeyValue> {
        self.do_eviction_at(Instant::now())
    }

    /// Remove and return every item expired at `now`, oldest first
    pub fn do_eviction_at(&self, now: Instant) -> Vec<KeyValue> {
        let mut state = self.state.lock();
        let mut expired = Vec::new();

        loop {
            state.drop_stale_front();
            match state.queue.front() {
                Some((_, expiry)) if *expiry <= now => {}
                _ => break,
            }
            if let Some((key, _)) = state.queue.pop_front() {
                state.live.remove(&key);
                expired.push(key);
            }
        }
        expired
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.queue.clear();
        state.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_follows_insertion_time() {
        let policy = TtlEvictionPolicy::new(Duration::from_secs(10));
        let start = Instant::now();
        policy.add_item_at(KeyValue::from(1), start).unwrap();
        policy.add_item_at(KeyValue::from(2), start + Duration::from_secs(5)).unwrap();

        assert!(!policy.is_eviction_required_at(start + Duration::from_secs(9)));
        assert!(policy.is_eviction_required_at(start + Duration::from_secs(10)));

        assert_eq!(policy.do_eviction_at(start + Duration::from_secs(12)), vec![KeyValue::from(1)]);
        assert_eq!(policy.do_eviction_at(start + Duration::from_secs(20)), vec![KeyValue::from(2)]);
        assert!(policy.is_empty());
    }

    #[test]
    fn test_removed_items_are_skipped() {
        let policy = TtlEvictionPolicy::new(Duration::from_secs(1));
        let start = Instant::now();
        for key in 0..3 {
            policy.add_item_at(KeyValue::from(key), start).unwrap();
        }
        assert!(policy.try_remove(&KeyValue::from(0)));

        // re-added later: the old queue entry must not expire it early
        policy.add_item_at(KeyValue::from(0), start + Duration::from_secs(5)).unwrap();

        let expired = policy.do_eviction_at(start + Duration::from_secs(2));
        assert_eq!(expired, vec![KeyValue::from(1), KeyValue::from(2)]);
        assert!(!policy.is_eviction_required_at(start + Duration::from_secs(2)));
        assert_eq!(policy.len(), 1);
    }
}
