use std::collections::HashMap;
use std::sync::Arc;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{KeyValue, Record};
use crate::index::IndexReader;
use crate::query::ast::QueryOperator;

/// Read-only view over the primary map or a unique-key map
pub struct UniqueIndex<'a> {
    name: &'a str,
    map: &'a HashMap<KeyValue, Arc<Record>>,
}

impl<'a> UniqueIndex<'a> {
    pub fn new(name: &'a str, map: &'a HashMap<KeyValue, Arc<Record>>) -> Self {
        UniqueIndex { name, map }
    }

    fn check_query(&self, values: &[KeyValue], operator: QueryOperator) -> Result<()> {
        if operator != QueryOperator::Eq {
            return Err(Error::new(
                ErrorKind::UnsupportedOperatorForIndexType,
                format!("Only Eq is supported on unique key '{}', got {:?}", self.name, operator),
            ));
        }
        operator.check_arity(values)
    }
}

impl IndexReader for UniqueIndex<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn get_many(&self, values: &[KeyValue], operator: QueryOperator) -> Result<Vec<Arc<Record>>> {
        self.check_query(values, operator)?;
        Ok(self.map.get(&values[0]).cloned().into_iter().collect())
    }

    fn get_count(&self, values: &[KeyValue], operator: QueryOperator, _fast_estimate: bool) -> Result<usize> {
        self.check_query(values, operator)?;
        Ok(usize::from(self.map.contains_key(&values[0])))
    }

    fn get_all(&self) -> Result<Vec<Arc<Record>>> {
        Ok(self.map.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_only() {
        let mut map = HashMap::new();
        map.insert(KeyValue::from("T-1"), Arc::new(Record::new("Trade", 1).with_unique_key("T-1")));
        let index = UniqueIndex::new("reference", &map);

        assert_eq!(index.get_many(&[KeyValue::from("T-1")], QueryOperator::Eq).unwrap().len(), 1);
        assert_eq!(index.get_count(&[KeyValue::from("T-2")], QueryOperator::Eq, false).unwrap(), 0);
        assert_eq!(index.get_all().unwrap().len(), 1);

        let err = index.get_many(&[KeyValue::from("T-1")], QueryOperator::Ge).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedOperatorForIndexType);
    }
}
