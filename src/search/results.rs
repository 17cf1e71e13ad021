use std::collections::BinaryHeap;
use std::cmp::Ordering;
use std::sync::Arc;
use crate::core::types::{KeyValue, Record};
use crate::query::planner::ExecutionPlan;

/// Primary key with relevance score
#[derive(Debug, Clone)]
pub struct RankedKey {
    pub key: KeyValue,
    pub score: f32,
}

// Implement ordering for heap
impl PartialEq for RankedKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedKey {}

impl PartialOrd for RankedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedKey {
    // Reversed so the heap top is the weakest hit
    fn cmp(&self, other: &Self) -> Ordering {
        other.score
            .total_cmp(&self.score)
            .then_with(|| self.key.cmp(&other.key))
    }
}

/// Top-K collector for efficient result collection
pub struct TopKCollector {
    pub heap: BinaryHeap<RankedKey>,
    pub k: usize,
    pub total_collected: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k + 1),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, hit: RankedKey) {
        self.total_collected += 1;
        if self.k == 0 {
            return;
        }

        self.heap.push(hit);
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    /// Best hit first, ties broken by primary key
    pub fn get_results(self) -> Vec<RankedKey> {
        self.heap.into_sorted_vec()
    }
}

/// Record returned by a query, with its full-text relevance (0 for
/// structured-only queries)
#[derive(Debug, Clone)]
pub struct RankedRecord {
    pub record: Arc<Record>,
    pub rank: f32,
}

impl RankedRecord {
    pub fn unranked(record: Arc<Record>) -> Self {
        RankedRecord { record, rank: 0.0 }
    }
}

/// Records matched by a query together with the plan used to find them
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub items: Vec<RankedRecord>,
    pub plan: ExecutionPlan,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.items.iter().map(|item| &item.record)
    }

    pub fn primary_keys(&self) -> Vec<KeyValue> {
        self.records().map(|r| r.primary_key.clone()).collect()
    }
}
