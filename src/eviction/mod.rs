pub mod queue;
pub mod lru;
pub mod ttl;

use std::time::Duration;
use crate::core::error::Result;
use crate::core::types::KeyValue;
use self::lru::LruEvictionPolicy;
use self::ttl::TtlEvictionPolicy;

/// Decides when eviction triggers and which records go.
///
/// Every hook takes `&self`: `touch` runs on the read path, which may be
/// concurrent with other reads.
#[derive(Default)]
pub enum EvictionPolicy {
    #[default]
    None,
    Lru(LruEvictionPolicy),
    Ttl(TtlEvictionPolicy),
}

impl EvictionPolicy {
    pub fn lru(limit: usize, eviction_count: usize) -> Self {
        EvictionPolicy::Lru(LruEvictionPolicy::new(limit, eviction_count))
    }

    pub fn ttl(time_to_live: Duration) -> Self {
        EvictionPolicy::Ttl(TtlEvictionPolicy::new(time_to_live))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::None => "none",
            EvictionPolicy::Lru(_) => "lru",
            EvictionPolicy::Ttl(_) => "ttl",
        }
    }

    pub fn add_item(&self, key: KeyValue) -> Result<()> {
        match self {
            EvictionPolicy::None => Ok(()),
            EvictionPolicy::Lru(policy) => policy.add_item(key),
            EvictionPolicy::Ttl(policy) => policy.add_item(key),
        }
    }

    /// Record an access; only recency-based policies care
    pub fn touch(&self, key: &KeyValue) {
        if let EvictionPolicy::Lru(policy) = self {
            policy.touch(key);
        }
    }

    pub fn touch_many<'a>(&self, keys: impl IntoIterator<Item = &'a KeyValue>) {
        if let EvictionPolicy::Lru(policy) = self {
            for key in keys {
                policy.touch(key);
            }
        }
    }

    /// Stop tracking a key that was deleted rather than evicted
    pub fn try_remove(&self, key: &KeyValue) -> bool {
        match self {
            EvictionPolicy::None => false,
            EvictionPolicy::Lru(policy) => policy.try_remove(key),
            EvictionPolicy::Ttl(policy) => policy.try_remove(key),
        }
    }

    pub fn is_eviction_required(&self) -> bool {
        match self {
            EvictionPolicy::None => false,
            EvictionPolicy::Lru(policy) => policy.is_eviction_required(),
            EvictionPolicy::Ttl(policy) => policy.is_eviction_required(),
        }
    }

    /// Keys to evict now. They are no longer tracked by the policy.
    pub fn do_eviction(&self) -> Vec<KeyValue> {
        match self {
            EvictionPolicy::None => Vec::new(),
            EvictionPolicy::Lru(policy) => policy.do_eviction(),
            EvictionPolicy::Ttl(policy) => policy.do_eviction(),
        }
    }

    pub fn clear(&self) {
        match self {
            EvictionPolicy::None => {}
            EvictionPolicy::Lru(policy) => policy.clear(),
            EvictionPolicy::Ttl(policy) => policy.clear(),
        }
    }
}
