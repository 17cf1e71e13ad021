use crate::core::error::Result;
use crate::core::types::Record;
use crate::query::ast::{AndQuery, AtomicQuery};
use crate::schema::schema::{CollectionSchema, KeySlot};

/// Conjunction compiled against a schema, evaluated record by record
pub struct RecordMatcher<'a> {
    predicates: Vec<(KeySlot, &'a AtomicQuery)>,
}

impl<'a> RecordMatcher<'a> {
    /// Resolve every field of the query. Unknown fields and malformed
    /// operator arity are rejected here, before any record is read.
    pub fn new(schema: &CollectionSchema, query: &'a AndQuery) -> Result<Self> {
        let mut predicates = Vec::with_capacity(query.elements.len());
        for element in &query.elements {
            let slot = schema.slot_or_err(&element.field)?;
            element.operator.check_arity(&element.values)?;
            predicates.push((slot, element));
        }
        Ok(RecordMatcher { predicates })
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn slot(&self, position: usize) -> Option<KeySlot> {
        self.predicates.get(position).map(|(slot, _)| *slot)
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.predicates
            .iter()
            .all(|(slot, query)| Self::matches_one(*slot, query, record))
    }

    /// Like `matches` but ignoring the predicate at `skip`, which the caller
    /// already resolved through an index.
    pub fn matches_except(&self, record: &Record, skip: usize) -> bool {
        self.predicates
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != skip)
            .all(|(_, (slot, query))| Self::matches_one(*slot, query, record))
    }

    // a list field matches when any of its values does
    fn matches_one(slot: KeySlot, query: &AtomicQuery, record: &Record) -> bool {
        slot.values(&query.field, record)
            .into_iter()
            .any(|value| query.matches_value(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("Trade", "id")
            .add_ordered_index("amount")
            .add_list_index("tags")
    }

    #[test]
    fn test_matches_scalar_and_list() {
        let schema = schema();
        let record = Record::new("Trade", 7)
            .with_index_key(150)
            .with_list_value("tags", "fx")
            .with_list_value("tags", "spot");

        let query = AndQuery::new()
            .with(AtomicQuery::gt("amount", 100))
            .with(AtomicQuery::eq("tags", "spot"));
        let matcher = RecordMatcher::new(&schema, &query).unwrap();
        assert!(matcher.matches(&record));

        let query = query.with(AtomicQuery::eq("id", 8));
        let matcher = RecordMatcher::new(&schema, &query).unwrap();
        assert!(!matcher.matches(&record));
        assert!(matcher.matches_except(&record, 2));
    }

    #[test]
    fn test_unknown_field() {
        let schema = schema();
        let query = AndQuery::new().with(AtomicQuery::eq("colour", "red"));
        let err = RecordMatcher::new(&schema, &query).err().unwrap();
        assert_eq!(err.kind, ErrorKind::UnknownIndexKey);
    }
}
