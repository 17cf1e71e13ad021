pub mod ordered;
pub mod dictionary;
pub mod unique;
pub mod inverted;
pub mod posting;

use std::sync::Arc;
use crate::core::error::Result;
use crate::core::types::{KeyValue, Record};
use crate::query::ast::QueryOperator;
use crate::schema::schema::{IndexDefinition, IndexType};
use self::dictionary::DictionaryIndex;
use self::ordered::OrderedIndex;

/// Read contract shared by secondary indexes and the unique-key adapter,
/// so the planner can treat them uniformly.
pub trait IndexReader {
    fn name(&self) -> &str;

    fn get_many(&self, values: &[KeyValue], operator: QueryOperator) -> Result<Vec<Arc<Record>>>;

    /// Number of records `get_many` would return. `fast_estimate` allows an
    /// upper bound where an exact count is expensive.
    fn get_count(&self, values: &[KeyValue], operator: QueryOperator, fast_estimate: bool) -> Result<usize>;

    fn get_all(&self) -> Result<Vec<Arc<Record>>>;
}

/// Mutable secondary index owned by a store
pub trait Index: IndexReader + Send + Sync {
    fn index_type(&self) -> IndexType;

    fn put(&mut self, record: Arc<Record>);

    /// Returns whether the record was indexed
    fn remove_one(&mut self, record: &Record) -> Result<bool>;

    fn remove_many(&mut self, records: &[Arc<Record>]) -> Result<()>;

    /// Enter bulk-load mode
    fn begin_fill(&mut self) -> Result<()>;

    fn end_fill(&mut self) -> Result<()>;

    fn clear(&mut self);

    fn as_reader(&self) -> &dyn IndexReader;
}

/// Build the index declared by a schema entry. `position` is the slot in
/// `Record::index_keys` for scalar indexes.
pub fn create_index(definition: &IndexDefinition, position: Option<usize>) -> Box<dyn Index> {
    match (definition.index_type, definition.is_list, position) {
        (IndexType::Ordered, false, Some(position)) => {
            Box::new(OrderedIndex::new(&definition.name, position))
        }
        (_, true, _) | (_, _, None) => Box::new(DictionaryIndex::for_list(&definition.name)),
        (IndexType::Dictionary, false, Some(position)) => {
            Box::new(DictionaryIndex::for_scalar(&definition.name, position))
        }
    }
}
