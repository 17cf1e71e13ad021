use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{KeyValue, Record};
use crate::index::{Index, IndexReader};
use crate::query::ast::QueryOperator;
use crate::schema::schema::IndexType;

/// Which part of a record feeds the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySource {
    Scalar(usize),
    List, // one record under every value of the list
}

/// Hash index: key value -> (primary key -> record).
/// Equality and membership only.
pub struct DictionaryIndex {
    name: String,
    source: KeySource,
    data: HashMap<KeyValue, HashMap<KeyValue, Arc<Record>>>,
}

impl DictionaryIndex {
    pub fn for_scalar(name: &str, key_position: usize) -> Self {
        DictionaryIndex {
            name: name.to_string(),
            source: KeySource::Scalar(key_position),
            data: HashMap::new(),
        }
    }

    pub fn for_list(name: &str) -> Self {
        DictionaryIndex {
            name: name.to_string(),
            source: KeySource::List,
            data: HashMap::new(),
        }
    }

    pub fn is_list(&self) -> bool {
        self.source == KeySource::List
    }

    /// Number of distinct key values
    pub fn key_count(&self) -> usize {
        self.data.len()
    }

    fn keys_of<'a>(&self, record: &'a Record) -> Vec<&'a KeyValue> {
        match self.source {
            KeySource::Scalar(position) => record.index_keys.get(position).into_iter().collect(),
            KeySource::List => record.list_values(&self.name),
        }
    }

    fn check_query(&self, values: &[KeyValue], operator: QueryOperator) -> Result<()> {
        if !operator.is_equality() {
            return Err(Error::new(
                ErrorKind::UnsupportedOperatorForIndexType,
                format!("{:?} is not supported by dictionary index '{}'", operator, self.name),
            ));
        }
        operator.check_arity(values)
    }

    /// Sub-maps for each distinct non-null value
    fn buckets<'a>(&'a self, values: &[KeyValue]) -> Vec<&'a HashMap<KeyValue, Arc<Record>>> {
        let mut seen: HashSet<&KeyValue> = HashSet::new();
        values
            .iter()
            .filter(|v| !v.is_null() && seen.insert(*v))
            .filter_map(|v| self.data.get(v))
            .collect()
    }

    fn remove_from_buckets(&mut self, record: &Record) -> bool {
        let keys: Vec<KeyValue> = self.keys_of(record).into_iter().cloned().collect();
        let mut removed = false;
        for key in keys {
            if let Some(bucket) = self.data.get_mut(&key) {
                removed |= bucket.remove(&record.primary_key).is_some();
                if bucket.is_empty() {
                    self.data.remove(&key);
                }
            }
        }
        removed
    }
}

impl IndexReader for DictionaryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_many(&self, values: &[KeyValue], operator: QueryOperator) -> Result<Vec<Arc<Record>>> {
        self.check_query(values, operator)?;

        let buckets = self.buckets(values);
        if let [bucket] = buckets.as_slice() {
            return Ok(bucket.values().cloned().collect());
        }

        // a list-backed record can sit in several buckets
        let mut seen: HashSet<&KeyValue> = HashSet::new();
        Ok(buckets
            .into_iter()
            .flat_map(|bucket| bucket.iter())
            .filter(|(key, _)| seen.insert(*key))
            .map(|(_, record)| record.clone())
            .collect())
    }

    /// With `fast_estimate` a list index returns the sum of bucket sizes,
    /// an upper bound, instead of counting distinct records.
    fn get_count(&self, values: &[KeyValue], operator: QueryOperator, fast_estimate: bool) -> Result<usize> {
        self.check_query(values, operator)?;

        let buckets = self.buckets(values);
        if !self.is_list() || fast_estimate || buckets.len() <= 1 {
            return Ok(buckets.iter().map(|b| b.len()).sum());
        }

        let distinct: HashSet<&KeyValue> = buckets.iter().flat_map(|b| b.keys()).collect();
        Ok(distinct.len())
    }

    fn get_all(&self) -> Result<Vec<Arc<Record>>> {
        let mut seen: HashSet<&KeyValue> = HashSet::new();
        Ok(self
            .data
            .values()
            .flat_map(|bucket| bucket.iter())
            .filter(|(key, _)| seen.insert(*key))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

impl Index for DictionaryIndex {
    fn index_type(&self) -> IndexType {
        IndexType::Dictionary
    }

    fn put(&mut self, record: Arc<Record>) {
        let keys: Vec<KeyValue> = self.keys_of(&record).into_iter().cloned().collect();
        for key in keys {
            self.data
                .entry(key)
                .or_default()
                .insert(record.primary_key.clone(), record.clone());
        }
    }

    fn remove_one(&mut self, record: &Record) -> Result<bool> {
        Ok(self.remove_from_buckets(record))
    }

    fn remove_many(&mut self, records: &[Arc<Record>]) -> Result<()> {
        for record in records {
            self.remove_from_buckets(record);
        }
        Ok(())
    }

    // hash indexes have nothing to defer
    fn begin_fill(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_fill(&mut self) -> Result<()> {
        Ok(())
    }

    fn clear(&mut self) {
        self.data.clear();
    }

    fn as_reader(&self) -> &dyn IndexReader {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(id: i64, desk: &str) -> Arc<Record> {
        Arc::new(Record::new("Trade", id).with_index_key(desk))
    }

    fn tagged(id: i64, tags: &[&str]) -> Arc<Record> {
        let mut record = Record::new("Trade", id);
        for tag in tags {
            record = record.with_list_value("tags", *tag);
        }
        Arc::new(record)
    }

    #[test]
    fn test_scalar_eq_and_in() {
        let mut index = DictionaryIndex::for_scalar("desk", 0);
        index.put(scalar(1, "london"));
        index.put(scalar(2, "paris"));
        index.put(scalar(3, "london"));

        let london = index.get_many(&[KeyValue::from("london")], QueryOperator::Eq).unwrap();
        assert_eq!(london.len(), 2);

        let values = [KeyValue::from("london"), KeyValue::from("paris"), KeyValue::from("tokyo")];
        assert_eq!(index.get_many(&values, QueryOperator::In).unwrap().len(), 3);
        assert_eq!(index.get_count(&values, QueryOperator::In, false).unwrap(), 3);
    }

    #[test]
    fn test_comparison_operators_rejected() {
        let index = DictionaryIndex::for_scalar("desk", 0);
        for op in [QueryOperator::Lt, QueryOperator::Ge, QueryOperator::Between] {
            let err = index.get_many(&[KeyValue::from("a")], op).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnsupportedOperatorForIndexType);
        }
        let err = index.get_count(&[], QueryOperator::Eq, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_list_index_counts_each_record_once() {
        let mut index = DictionaryIndex::for_list("tags");
        index.put(tagged(1, &["fx", "rates"]));
        index.put(tagged(2, &["fx"]));
        index.put(tagged(3, &["credit"]));

        let values = [KeyValue::from("fx"), KeyValue::from("rates")];
        assert_eq!(index.get_many(&values, QueryOperator::In).unwrap().len(), 2);
        assert_eq!(index.get_count(&values, QueryOperator::In, false).unwrap(), 2);
        assert_eq!(index.get_count(&values, QueryOperator::In, true).unwrap(), 3);
        assert_eq!(index.get_all().unwrap().len(), 3);
    }

    #[test]
    fn test_remove_under_every_key() {
        let mut index = DictionaryIndex::for_list("tags");
        let first = tagged(1, &["fx", "rates"]);
        index.put(first.clone());
        index.put(tagged(2, &["fx"]));

        assert!(index.remove_one(&first).unwrap());
        assert!(!index.remove_one(&first).unwrap());
        assert!(index.get_many(&[KeyValue::from("rates")], QueryOperator::Eq).unwrap().is_empty());
        assert_eq!(index.get_many(&[KeyValue::from("fx")], QueryOperator::Eq).unwrap().len(), 1);
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn test_null_never_matches() {
        let mut index = DictionaryIndex::for_scalar("desk", 0);
        index.put(Arc::new(Record::new("Trade", 1).with_index_key(KeyValue::Null)));

        assert!(index.get_many(&[KeyValue::Null], QueryOperator::Eq).unwrap().is_empty());
        assert_eq!(index.get_all().unwrap().len(), 1);
    }
}
