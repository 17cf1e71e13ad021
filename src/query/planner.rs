use std::time::Duration;
use serde::{Serialize, Deserialize};

/// How one conjunction was resolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub primary_index: Option<String>, // index or key that produced the candidates
    pub candidates: usize,             // count reported by that index
    pub fetched: usize,                // records actually fetched before filtering
    pub index_counts: Vec<(String, usize)>,
    pub full_scan: bool,
    pub simple: bool,                  // single predicate answered by one lookup
}

impl QueryPlan {
    pub fn simple(index: &str, candidates: usize) -> Self {
        QueryPlan {
            primary_index: Some(index.to_string()),
            candidates,
            fetched: candidates,
            simple: true,
            ..QueryPlan::default()
        }
    }

    pub fn full_scan(candidates: usize) -> Self {
        QueryPlan {
            candidates,
            fetched: candidates,
            full_scan: true,
            ..QueryPlan::default()
        }
    }
}

/// Diagnostic record of a query call, returned with its result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub query_plans: Vec<QueryPlan>,
    pub full_text_hits: Option<usize>,
    pub elapsed: Duration,
}

impl ExecutionPlan {
    /// Index chosen for the first conjunction
    pub fn primary_index_name(&self) -> Option<&str> {
        self.query_plans.first().and_then(|p| p.primary_index.as_deref())
    }

    pub fn is_full_scan(&self) -> bool {
        self.query_plans.iter().any(|p| p.full_scan)
    }

    pub fn used_full_text(&self) -> bool {
        self.full_text_hits.is_some()
    }
}

/// Index predicate with the number of records it would produce
#[derive(Debug, Clone, PartialEq)]
pub struct IndexCandidate {
    pub name: String,
    pub predicate: usize, // position in the conjunction
    pub count: usize,
}

/// Picks the most selective index. Ties go to the earliest predicate.
pub fn choose_primary_index(candidates: &[IndexCandidate]) -> Option<&IndexCandidate> {
    let chosen = candidates.iter().min_by_key(|c| (c.count, c.predicate));
    if let Some(candidate) = chosen {
        tracing::trace!(
            "[planner]: primary index '{}' with {} candidates out of {} indexes",
            candidate.name,
            candidate.count,
            candidates.len()
        );
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, predicate: usize, count: usize) -> IndexCandidate {
        IndexCandidate { name: name.to_string(), predicate, count }
    }

    #[test]
    fn test_smallest_count_wins() {
        let candidates = vec![candidate("B", 0, 50), candidate("A", 1, 3), candidate("C", 2, 3)];
        assert_eq!(choose_primary_index(&candidates).map(|c| c.name.as_str()), Some("A"));
        assert!(choose_primary_index(&[]).is_none());
    }

    #[test]
    fn test_plan_accessors() {
        let plan = ExecutionPlan {
            query_plans: vec![QueryPlan::simple("amount", 4), QueryPlan::full_scan(10)],
            ..ExecutionPlan::default()
        };
        assert_eq!(plan.primary_index_name(), Some("amount"));
        assert!(plan.is_full_scan());
        assert!(!plan.used_full_text());
    }
}
