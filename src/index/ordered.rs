use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{KeyValue, Record};
use crate::index::{Index, IndexReader};
use crate::query::ast::QueryOperator;
use crate::schema::schema::IndexType;

static NULL_KEY: KeyValue = KeyValue::Null;

/// Bulk-load state of an ordered index
enum FillMode {
    Normal,
    Filling(Vec<Arc<Record>>), // unsorted side buffer
}

/// Result of probing the sorted array for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Some element with exactly this key, anywhere inside its run
    Found(usize),
    /// No element with this key; elements before the position are smaller
    Missing(usize),
}

/// Sorted-array index supporting every comparison operator.
///
/// Records are kept ordered by (index key, primary key). Duplicate keys form
/// adjacent runs; lookups binary search to any element of a run and then walk
/// to its boundaries.
pub struct OrderedIndex {
    name: String,
    key_position: usize,
    items: Vec<Arc<Record>>,
    mode: FillMode,
}

impl OrderedIndex {
    pub fn new(name: &str, key_position: usize) -> Self {
        OrderedIndex {
            name: name.to_string(),
            key_position,
            items: Vec::new(),
            mode: FillMode::Normal,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_filling(&self) -> bool {
        matches!(self.mode, FillMode::Filling(_))
    }

    fn key_of<'a>(&self, record: &'a Record) -> &'a KeyValue {
        record.index_keys.get(self.key_position).unwrap_or(&NULL_KEY)
    }

    fn key_at(&self, position: usize) -> &KeyValue {
        self.key_of(&self.items[position])
    }

    fn compare_records(&self, left: &Record, right: &Record) -> Ordering {
        self.key_of(left)
            .cmp(self.key_of(right))
            .then_with(|| left.primary_key.cmp(&right.primary_key))
    }

    fn ensure_normal(&self, operation: &str) -> Result<()> {
        if self.is_filling() {
            return Err(Error::new(
                ErrorKind::IllegalState,
                format!("{} on index '{}' during bulk load", operation, self.name),
            ));
        }
        Ok(())
    }

    /// Narrow the window until one or two elements remain, then decide by
    /// direct comparison.
    fn locate(&self, value: &KeyValue) -> Position {
        if self.items.is_empty() {
            return Position::Missing(0);
        }

        let mut low = 0;
        let mut high = self.items.len() - 1;

        loop {
            if high - low <= 1 {
                match self.key_at(low).cmp(value) {
                    Ordering::Equal => return Position::Found(low),
                    Ordering::Greater => return Position::Missing(low),
                    Ordering::Less => {}
                }
                if high == low {
                    return Position::Missing(low + 1);
                }
                return match self.key_at(high).cmp(value) {
                    Ordering::Equal => Position::Found(high),
                    Ordering::Greater => Position::Missing(high),
                    Ordering::Less => Position::Missing(high + 1),
                };
            }

            let middle = low + (high - low) / 2;
            match self.key_at(middle).cmp(value) {
                Ordering::Equal => return Position::Found(middle),
                Ordering::Less => low = middle,
                Ordering::Greater => high = middle,
            }
        }
    }

    /// Positions of the run of elements whose key equals `value`.
    /// Empty range at the insertion point when there is none.
    fn equal_range(&self, value: &KeyValue) -> Range<usize> {
        match self.locate(value) {
            Position::Missing(position) => position..position,
            Position::Found(position) => {
                let mut start = position;
                while start > 0 && self.key_at(start - 1) == value {
                    start -= 1;
                }
                let mut end = position + 1;
                while end < self.items.len() && self.key_at(end) == value {
                    end += 1;
                }
                start..end
            }
        }
    }

    /// Matching positions for every operator except `In`
    fn matching_range(&self, values: &[KeyValue], operator: QueryOperator) -> Range<usize> {
        let len = self.items.len();
        let value = &values[0];
        match operator {
            QueryOperator::Eq => {
                if value.is_null() {
                    0..0
                } else {
                    self.equal_range(value)
                }
            }
            QueryOperator::Lt => 0..self.equal_range(value).start,
            QueryOperator::Le => 0..self.equal_range(value).end,
            QueryOperator::Gt => self.equal_range(value).end..len,
            QueryOperator::Ge => self.equal_range(value).start..len,
            QueryOperator::Between => {
                let start = self.equal_range(&values[0]).start;
                let end = self.equal_range(&values[1]).end;
                if start < end { start..end } else { start..start }
            }
            QueryOperator::In => 0..0,
        }
    }

    /// Runs for each distinct non-null `In` value
    fn in_ranges(&self, values: &[KeyValue]) -> Vec<Range<usize>> {
        let mut distinct: Vec<&KeyValue> = values.iter().filter(|v| !v.is_null()).collect();
        distinct.sort();
        distinct.dedup();
        distinct
            .into_iter()
            .map(|v| self.equal_range(v))
            .filter(|r| !r.is_empty())
            .collect()
    }

    fn check_query(&self, values: &[KeyValue], operator: QueryOperator) -> Result<()> {
        self.ensure_normal("Read")?;
        operator.check_arity(values)
    }
}

impl IndexReader for OrderedIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_many(&self, values: &[KeyValue], operator: QueryOperator) -> Result<Vec<Arc<Record>>> {
        self.check_query(values, operator)?;

        if operator == QueryOperator::In {
            return Ok(self
                .in_ranges(values)
                .into_iter()
                .flat_map(|r| self.items[r].iter().cloned())
                .collect());
        }

        let range = self.matching_range(values, operator);
        Ok(self.items[range].to_vec())
    }

    /// Always exact; `fast_estimate` is accepted for interface compatibility
    fn get_count(&self, values: &[KeyValue], operator: QueryOperator, _fast_estimate: bool) -> Result<usize> {
        self.check_query(values, operator)?;

        if operator == QueryOperator::In {
            return Ok(self.in_ranges(values).iter().map(|r| r.len()).sum());
        }
        Ok(self.matching_range(values, operator).len())
    }

    fn get_all(&self) -> Result<Vec<Arc<Record>>> {
        self.ensure_normal("Read")?;
        Ok(self.items.clone())
    }
}

impl Index for OrderedIndex {
    fn index_type(&self) -> IndexType {
        IndexType::Ordered
    }

    fn put(&mut self, record: Arc<Record>) {
        if let FillMode::Filling(buffer) = &mut self.mode {
            buffer.push(record);
            return;
        }
        let position = self
            .items
            .partition_point(|r| self.compare_records(r, &record) == Ordering::Less);
        self.items.insert(position, record);
    }

    fn remove_one(&mut self, record: &Record) -> Result<bool> {
        self.ensure_normal("Remove")?;

        let key = self.key_of(record).clone();
        let run = self.equal_range(&key);
        let found = run
            .clone()
            .find(|&position| self.items[position].primary_key == record.primary_key);

        match found {
            Some(position) => {
                self.items.remove(position);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_many(&mut self, records: &[Arc<Record>]) -> Result<()> {
        self.ensure_normal("Remove")?;

        let excluded: HashSet<&KeyValue> = records.iter().map(|r| &r.primary_key).collect();
        self.items.retain(|r| !excluded.contains(&r.primary_key));
        Ok(())
    }

    fn begin_fill(&mut self) -> Result<()> {
        self.ensure_normal("Begin fill")?;
        self.mode = FillMode::Filling(Vec::new());
        Ok(())
    }

    fn end_fill(&mut self) -> Result<()> {
        let buffer = match std::mem::replace(&mut self.mode, FillMode::Normal) {
            FillMode::Filling(buffer) => buffer,
            FillMode::Normal => {
                return Err(Error::new(
                    ErrorKind::IllegalState,
                    format!("End fill on index '{}' without begin fill", self.name),
                ));
            }
        };

        tracing::debug!("[ordered index {}]: sorting {} buffered records", self.name, buffer.len());
        let mut items = std::mem::take(&mut self.items);
        items.extend(buffer);
        items.sort_unstable_by(|a, b| self.compare_records(a, b));
        self.items = items;
        Ok(())
    }

    fn clear(&mut self) {
        self.items.clear();
        self.mode = FillMode::Normal;
    }

    fn as_reader(&self) -> &dyn IndexReader {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn record(id: i64, key: impl Into<KeyValue>) -> Arc<Record> {
        Arc::new(Record::new("Item", id).with_index_key(key))
    }

    fn ids(records: &[Arc<Record>]) -> Vec<i64> {
        let mut ids: Vec<i64> = records.iter().filter_map(|r| r.primary_key.as_i64()).collect();
        ids.sort();
        ids
    }

    fn brute_force(records: &[Arc<Record>], query: &crate::query::ast::AtomicQuery) -> Vec<i64> {
        let matching: Vec<Arc<Record>> = records
            .iter()
            .filter(|r| query.matches_value(&r.index_keys[0]))
            .cloned()
            .collect();
        ids(&matching)
    }

    fn random_records(rng: &mut StdRng, count: i64) -> Vec<Arc<Record>> {
        (0..count).map(|id| record(id, rng.gen_range(0..20))).collect()
    }

    #[test]
    fn test_queries_match_brute_force() {
        use crate::query::ast::AtomicQuery;

        let mut rng = StdRng::seed_from_u64(7);
        let records = random_records(&mut rng, 300);

        let mut index = OrderedIndex::new("value", 0);
        for r in &records {
            index.put(r.clone());
        }

        for target in -1..22 {
            let queries = vec![
                AtomicQuery::eq("value", target),
                AtomicQuery::lt("value", target),
                AtomicQuery::le("value", target),
                AtomicQuery::gt("value", target),
                AtomicQuery::ge("value", target),
                AtomicQuery::between("value", target, target + 3),
                AtomicQuery::in_values("value", vec![target, target + 5, target]),
            ];
            for query in queries {
                let found = index.get_many(&query.values, query.operator).unwrap();
                assert_eq!(ids(&found), brute_force(&records, &query), "{:?}", query);

                let count = index.get_count(&query.values, query.operator, false).unwrap();
                assert_eq!(count, found.len(), "{:?}", query);
            }
        }
    }

    #[test]
    fn test_duplicate_run_in_any_insertion_order() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut records: Vec<Arc<Record>> = (0..50).map(|id| record(id, 42)).collect();
            records.extend((50..80).map(|id| record(id, id % 3 * 100)));
            records.shuffle(&mut rng);

            let mut index = OrderedIndex::new("value", 0);
            for r in &records {
                index.put(r.clone());
            }

            let found = index.get_many(&[KeyValue::from(42)], QueryOperator::Eq).unwrap();
            assert_eq!(found.len(), 50);
            assert_eq!(ids(&found), (0..50).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_bulk_load_matches_incremental_load() {
        let mut rng = StdRng::seed_from_u64(11);
        let records = random_records(&mut rng, 200);

        let mut incremental = OrderedIndex::new("value", 0);
        let mut bulk = OrderedIndex::new("value", 0);

        // a few items present before the fill session
        for r in &records[..20] {
            incremental.put(r.clone());
            bulk.put(r.clone());
        }

        bulk.begin_fill().unwrap();
        for r in &records[20..] {
            incremental.put(r.clone());
            bulk.put(r.clone());
        }
        bulk.end_fill().unwrap();

        assert_eq!(incremental.get_all().unwrap(), bulk.get_all().unwrap());

        for op in [QueryOperator::Le, QueryOperator::Gt, QueryOperator::Eq] {
            let values = [KeyValue::from(9)];
            assert_eq!(
                ids(&incremental.get_many(&values, op).unwrap()),
                ids(&bulk.get_many(&values, op).unwrap())
            );
        }
    }

    #[test]
    fn test_fill_session_misuse() {
        let mut index = OrderedIndex::new("value", 0);
        index.put(record(1, 5));
        index.begin_fill().unwrap();
        index.put(record(2, 5));

        assert_eq!(index.begin_fill().unwrap_err().kind, ErrorKind::IllegalState);
        assert_eq!(
            index.get_many(&[KeyValue::from(5)], QueryOperator::Eq).unwrap_err().kind,
            ErrorKind::IllegalState
        );
        assert_eq!(index.remove_one(&record(1, 5)).unwrap_err().kind, ErrorKind::IllegalState);

        index.end_fill().unwrap();
        assert_eq!(index.end_fill().unwrap_err().kind, ErrorKind::IllegalState);
        assert_eq!(index.get_count(&[KeyValue::from(5)], QueryOperator::Eq, true).unwrap(), 2);
    }

    #[test]
    fn test_remove_one_inside_run() {
        let mut index = OrderedIndex::new("value", 0);
        for id in 0..10 {
            index.put(record(id, 1));
        }
        index.put(record(10, 0));
        index.put(record(11, 2));

        assert!(index.remove_one(&record(6, 1)).unwrap());
        assert!(!index.remove_one(&record(6, 1)).unwrap());
        // wrong key: not found even though the primary key exists
        assert!(!index.remove_one(&record(3, 2)).unwrap());

        let ones = index.get_many(&[KeyValue::from(1)], QueryOperator::Eq).unwrap();
        assert_eq!(ids(&ones), vec![0, 1, 2, 3, 4, 5, 7, 8, 9]);
        assert_eq!(index.len(), 11);
    }

    #[test]
    fn test_remove_many() {
        let mut index = OrderedIndex::new("value", 0);
        let records: Vec<Arc<Record>> = (0..10).map(|id| record(id, id % 4)).collect();
        for r in &records {
            index.put(r.clone());
        }

        index.remove_many(&records[2..6]).unwrap();
        let all = index.get_all().unwrap();
        assert_eq!(ids(&all), vec![0, 1, 6, 7, 8, 9]);
        assert!(all.windows(2).all(|w| index.compare_records(&w[0], &w[1]) == Ordering::Less));
    }

    #[test]
    fn test_between_edges() {
        let mut index = OrderedIndex::new("value", 0);
        for (id, key) in [(1, 10), (2, 20), (3, 30)] {
            index.put(record(id, key));
        }

        let exact = index.get_many(&[KeyValue::from(20), KeyValue::from(20)], QueryOperator::Between).unwrap();
        assert_eq!(ids(&exact), vec![2]);

        let gap = index.get_many(&[KeyValue::from(21), KeyValue::from(29)], QueryOperator::Between).unwrap();
        assert!(gap.is_empty());

        let inverted = index.get_many(&[KeyValue::from(30), KeyValue::from(10)], QueryOperator::Between).unwrap();
        assert!(inverted.is_empty());

        let mixed_numeric = index.get_many(&[KeyValue::Float(9.5), KeyValue::Float(20.0)], QueryOperator::Between).unwrap();
        assert_eq!(ids(&mixed_numeric), vec![1, 2]);
    }

    #[test]
    fn test_invalid_queries() {
        let index = OrderedIndex::new("value", 0);
        assert_eq!(index.get_many(&[], QueryOperator::Eq).unwrap_err().kind, ErrorKind::InvalidArgument);

        let two = [KeyValue::from(1), KeyValue::from(2)];
        assert_eq!(index.get_many(&two, QueryOperator::Lt).unwrap_err().kind, ErrorKind::InvalidIndexQuery);

        let three = [KeyValue::from(1), KeyValue::from(2), KeyValue::from(3)];
        assert_eq!(index.get_count(&three, QueryOperator::Between, true).unwrap_err().kind, ErrorKind::InvalidIndexQuery);
    }

    #[test]
    fn test_locate_on_small_arrays() {
        let mut index = OrderedIndex::new("value", 0);
        assert_eq!(index.locate(&KeyValue::from(1)), Position::Missing(0));

        index.put(record(1, 10));
        assert_eq!(index.locate(&KeyValue::from(5)), Position::Missing(0));
        assert_eq!(index.locate(&KeyValue::from(10)), Position::Found(0));
        assert_eq!(index.locate(&KeyValue::from(15)), Position::Missing(1));

        index.put(record(2, 20));
        assert_eq!(index.locate(&KeyValue::from(15)), Position::Missing(1));
        assert_eq!(index.locate(&KeyValue::from(20)), Position::Found(1));
        assert_eq!(index.locate(&KeyValue::from(25)), Position::Missing(2));

        let mut rng = StdRng::seed_from_u64(3);
        for id in 3..50 {
            index.put(record(id, rng.gen_range(0..100) * 2));
        }
        // odd keys are never present
        for target in (1..200).step_by(2) {
            let Position::Missing(position) = index.locate(&KeyValue::from(target)) else {
                panic!("odd key {} found", target);
            };
            assert!(index.items[..position].iter().all(|r| r.index_keys[0] < KeyValue::from(target)));
            assert!(index.items[position..].iter().all(|r| r.index_keys[0] > KeyValue::from(target)));
        }
    }
}
