use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{KeyValue, Record};
use crate::index::{Index, IndexReader};
use crate::index::unique::UniqueIndex;
use crate::query::ast::{AndQuery, AtomicQuery, OrQuery, QueryOperator};
use crate::query::matcher::RecordMatcher;
use crate::query::planner::{choose_primary_index, ExecutionPlan, IndexCandidate, QueryPlan};
use crate::schema::schema::{CollectionSchema, KeySlot};
use crate::search::fulltext::FullTextIndex;
use crate::search::results::{QueryResult, RankedKey, RankedRecord};

/// Resolves queries against a borrowed view of a store.
///
/// The executor is stateless. It does not count reads or touch the eviction
/// policy; the store does that with the returned records.
pub struct QueryExecutor<'a> {
    pub schema: &'a CollectionSchema,
    pub primary: &'a HashMap<KeyValue, Arc<Record>>,
    pub unique: &'a [HashMap<KeyValue, Arc<Record>>],
    pub indexes: &'a HashMap<String, Box<dyn Index>>,
    pub full_text: Option<&'a FullTextIndex>,
    pub parallel_full_text: bool,
}

impl<'a> QueryExecutor<'a> {
    pub fn execute(&self, query: &OrQuery) -> Result<QueryResult> {
        let start = Instant::now();
        let mut plan = ExecutionPlan::default();

        let items = if query.has_full_text() {
            self.execute_with_full_text(query, &mut plan)?
        } else {
            self.execute_structured(query, query.take, &mut plan)?
                .into_iter()
                .map(RankedRecord::unranked)
                .collect()
        };

        plan.elapsed = start.elapsed();
        Ok(QueryResult { items, plan })
    }

    /// Number of matching records. A single index predicate is answered by
    /// the index count without fetching records.
    pub fn count(&self, query: &OrQuery) -> Result<(usize, ExecutionPlan)> {
        if let Some(atomic) = Self::single_predicate(query) {
            let slot = self.schema.slot_or_err(&atomic.field)?;
            if let (KeySlot::Scalar(_) | KeySlot::List, Some(index)) = (slot, self.indexes.get(&atomic.field)) {
                let start = Instant::now();
                let count = index.get_count(&atomic.values, atomic.operator, false)?;
                let plan = ExecutionPlan {
                    query_plans: vec![QueryPlan::simple(&atomic.field, count)],
                    full_text_hits: None,
                    elapsed: start.elapsed(),
                };
                return Ok((count, plan));
            }
        }
        let result = self.execute(query)?;
        Ok((result.len(), result.plan))
    }

    fn single_predicate(query: &OrQuery) -> Option<&AtomicQuery> {
        if query.take.is_some() || query.has_full_text() {
            return None;
        }
        match query.elements.as_slice() {
            [and] if and.elements.len() == 1 => and.elements.first(),
            _ => None,
        }
    }

    fn execute_with_full_text(&self, query: &OrQuery, plan: &mut ExecutionPlan) -> Result<Vec<RankedRecord>> {
        let full_text = self.full_text.ok_or_else(|| Error::new(
            ErrorKind::InvalidArgument,
            format!("Full-text search is not enabled for {}", self.schema.type_name),
        ))?;
        let text = query.full_text.as_deref().unwrap_or_default();
        let search = || full_text.search(text, full_text.max_results());

        let take = query.take.unwrap_or(usize::MAX);
        if !query.has_predicates() {
            let hits = search();
            plan.full_text_hits = Some(hits.len());
            return Ok(self.resolve_hits(hits, None, take));
        }

        let (structured, hits) = if self.parallel_full_text {
            let (structured, hits) = rayon::join(
                || {
                    let mut structured_plan = ExecutionPlan::default();
                    self.execute_structured(query, None, &mut structured_plan)
                        .map(|records| (records, structured_plan))
                },
                search,
            );
            let (records, structured_plan) = structured?;
            plan.query_plans = structured_plan.query_plans;
            (records, hits)
        } else {
            let records = self.execute_structured(query, None, plan)?;
            (records, search())
        };
        plan.full_text_hits = Some(hits.len());

        let allowed: HashSet<&KeyValue> = structured.iter().map(|r| &r.primary_key).collect();
        Ok(self.resolve_hits(hits, Some(&allowed), take))
    }

    // full-text hits stay ordered by relevance
    fn resolve_hits(&self, hits: Vec<RankedKey>, allowed: Option<&HashSet<&KeyValue>>, take: usize) -> Vec<RankedRecord> {
        hits.into_iter()
            .filter(|hit| allowed.is_none_or(|keys| keys.contains(&hit.key)))
            .filter_map(|hit| {
                self.primary.get(&hit.key).map(|record| RankedRecord {
                    record: record.clone(),
                    rank: hit.score,
                })
            })
            .take(take)
            .collect()
    }

    fn execute_structured(&self, query: &OrQuery, take: Option<usize>, plan: &mut ExecutionPlan) -> Result<Vec<Arc<Record>>> {
        if query.elements.is_empty() {
            let records = self.all_records(take, &HashSet::new());
            plan.query_plans.push(QueryPlan::full_scan(records.len()));
            return Ok(records);
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for and in &query.elements {
            let remaining = take.map(|t| t.saturating_sub(out.len()));
            if remaining == Some(0) {
                break;
            }
            // records collected by earlier conjunctions do not use up the budget
            let (records, and_plan) = self.resolve_and(and, remaining, &seen)?;
            plan.query_plans.push(and_plan);
            for record in records {
                seen.insert(record.primary_key.clone());
                out.push(record);
            }
        }
        Ok(out)
    }

    fn all_records(&self, take: Option<usize>, exclude: &HashSet<KeyValue>) -> Vec<Arc<Record>> {
        admit(self.primary.values().cloned(), exclude, take.unwrap_or(usize::MAX))
    }

    /// Resolve one conjunction, returning at most `take` records
    pub fn execute_and(&self, query: &AndQuery, take: Option<usize>) -> Result<(Vec<Arc<Record>>, QueryPlan)> {
        self.resolve_and(query, take, &HashSet::new())
    }

    // `take` counts only records whose key is not in `exclude`
    fn resolve_and(&self, query: &AndQuery, take: Option<usize>, exclude: &HashSet<KeyValue>) -> Result<(Vec<Arc<Record>>, QueryPlan)> {
        let matcher = RecordMatcher::new(self.schema, query)?;
        if matcher.is_empty() {
            let records = self.all_records(take, exclude);
            return Ok((records, QueryPlan::full_scan(self.primary.len())));
        }
        let take = take.unwrap_or(usize::MAX);

        if matcher.len() == 1 {
            if let Some(result) = self.execute_single(&query.elements[0], &matcher, take, exclude)? {
                return Ok(result);
            }
        }

        // unique keys resolve to at most one record per value
        for (position, element) in query.elements.iter().enumerate() {
            let Some(slot) = matcher.slot(position) else { continue };
            if !slot.is_unique() || !element.operator.is_equality() {
                continue;
            }
            let hits = self.unique_lookup(&element.field, slot, &element.values)?;
            let plan = QueryPlan {
                primary_index: Some(element.field.clone()),
                candidates: hits.len(),
                fetched: hits.len(),
                index_counts: vec![(element.field.clone(), hits.len())],
                ..QueryPlan::default()
            };
            let matching = hits.into_iter().filter(|r| matcher.matches_except(r, position));
            return Ok((admit(matching, exclude, take), plan));
        }

        let mut candidates = Vec::new();
        for (position, element) in query.elements.iter().enumerate() {
            if let Some(index) = self.indexes.get(&element.field) {
                let count = index.get_count(&element.values, element.operator, true)?;
                candidates.push(IndexCandidate {
                    name: element.field.clone(),
                    predicate: position,
                    count,
                });
            }
        }
        let index_counts = candidates.iter().map(|c| (c.name.clone(), c.count)).collect();

        match choose_primary_index(&candidates) {
            Some(chosen) => {
                let mut plan = QueryPlan {
                    primary_index: Some(chosen.name.clone()),
                    candidates: chosen.count,
                    index_counts,
                    ..QueryPlan::default()
                };
                if chosen.count == 0 {
                    return Ok((Vec::new(), plan));
                }
                let element = &query.elements[chosen.predicate];
                let fetched = self.index_get_many(element)?;
                plan.fetched = fetched.len();
                let matching = fetched.into_iter().filter(|r| matcher.matches_except(r, chosen.predicate));
                Ok((admit(matching, exclude, take), plan))
            }
            None => {
                let records = self.scan(&matcher, take, exclude);
                let mut plan = QueryPlan::full_scan(self.primary.len());
                plan.index_counts = index_counts;
                Ok((records, plan))
            }
        }
    }

    // Ok(None) when the predicate has no direct lookup and needs a scan
    fn execute_single(
        &self,
        element: &AtomicQuery,
        matcher: &RecordMatcher,
        take: usize,
        exclude: &HashSet<KeyValue>,
    ) -> Result<Option<(Vec<Arc<Record>>, QueryPlan)>> {
        let Some(slot) = matcher.slot(0) else {
            return Ok(None);
        };
        let records = if slot.is_unique() {
            if !element.operator.is_equality() {
                return Ok(None);
            }
            self.unique_lookup(&element.field, slot, &element.values)?
        } else {
            self.index_get_many(element)?
        };
        let plan = QueryPlan::simple(&element.field, records.len());
        Ok(Some((admit(records.into_iter(), exclude, take), plan)))
    }

    fn index_get_many(&self, element: &AtomicQuery) -> Result<Vec<Arc<Record>>> {
        let index = self.indexes.get(&element.field).ok_or_else(|| Error::new(
            ErrorKind::UnknownIndexKey,
            format!("No index named '{}'", element.field),
        ))?;
        index.get_many(&element.values, element.operator)
    }

    fn unique_lookup(&self, field: &str, slot: KeySlot, values: &[KeyValue]) -> Result<Vec<Arc<Record>>> {
        let map = match slot {
            KeySlot::Primary => self.primary,
            KeySlot::Unique(position) => match self.unique.get(position) {
                Some(map) => map,
                None => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        };
        let reader = UniqueIndex::new(field, map);

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for value in values.iter().filter(|v| !v.is_null() && seen.insert(*v)) {
            records.extend(reader.get_many(std::slice::from_ref(value), QueryOperator::Eq)?);
        }
        Ok(records)
    }

    fn scan(&self, matcher: &RecordMatcher, take: usize, exclude: &HashSet<KeyValue>) -> Vec<Arc<Record>> {
        tracing::trace!("[executor]: full scan of {} records", self.primary.len());
        let matching = self.primary.values().filter(|r| matcher.matches(r)).cloned();
        admit(matching, exclude, take)
    }
}

fn admit(records: impl Iterator<Item = Arc<Record>>, exclude: &HashSet<KeyValue>, take: usize) -> Vec<Arc<Record>> {
    records
        .filter(|r| !exclude.contains(&r.primary_key))
        .take(take)
        .collect()
}

/// Shorthand used by the store for key lookups
pub fn key_query(field: &str, values: Vec<KeyValue>, operator: QueryOperator) -> OrQuery {
    OrQuery::single(AtomicQuery::new(field, operator, values))
}
