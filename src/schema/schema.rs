use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{KeyValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    Ordered,     // sorted, supports comparisons
    Dictionary,  // hashed, equality only
}

/// Secondary index declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub index_type: IndexType,
    pub is_list: bool,
}

/// Where a field's values live inside a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    Primary,
    Unique(usize),
    Scalar(usize),
    List,
}

impl KeySlot {
    pub fn values<'a>(&self, field: &str, record: &'a Record) -> Vec<&'a KeyValue> {
        match self {
            KeySlot::Primary => vec![&record.primary_key],
            KeySlot::Unique(position) => record.unique_keys.get(*position).into_iter().collect(),
            KeySlot::Scalar(position) => record.index_keys.get(*position).into_iter().collect(),
            KeySlot::List => record.list_values(field),
        }
    }

    /// Primary and unique keys are resolved by direct map lookups
    pub fn is_unique(&self) -> bool {
        matches!(self, KeySlot::Primary | KeySlot::Unique(_))
    }
}

/// Schema of the single record type held by a store.
///
/// Scalar indexes are declared in the same order as `Record::index_keys`;
/// list indexes are always hash backed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub type_name: String,
    pub primary_key: String,
    pub unique_keys: Vec<String>,
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionSchema {
    pub fn new(type_name: &str, primary_key: &str) -> Self {
        CollectionSchema {
            type_name: type_name.to_string(),
            primary_key: primary_key.to_string(),
            unique_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn add_unique_key(mut self, name: &str) -> Self {
        self.unique_keys.push(name.to_string());
        self
    }

    pub fn add_ordered_index(mut self, name: &str) -> Self {
        self.indexes.push(IndexDefinition {
            name: name.to_string(),
            index_type: IndexType::Ordered,
            is_list: false,
        });
        self
    }

    pub fn add_dictionary_index(mut self, name: &str) -> Self {
        self.indexes.push(IndexDefinition {
            name: name.to_string(),
            index_type: IndexType::Dictionary,
            is_list: false,
        });
        self
    }

    pub fn add_list_index(mut self, name: &str) -> Self {
        self.indexes.push(IndexDefinition {
            name: name.to_string(),
            index_type: IndexType::Dictionary,
            is_list: true,
        });
        self
    }

    /// Scalar index definitions paired with their position in `Record::index_keys`
    pub fn scalar_indexes(&self) -> impl Iterator<Item = (usize, &IndexDefinition)> {
        self.indexes.iter().filter(|d| !d.is_list).enumerate()
    }

    pub fn list_indexes(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indexes.iter().filter(|d| d.is_list)
    }

    pub fn scalar_index_count(&self) -> usize {
        self.indexes.iter().filter(|d| !d.is_list).count()
    }

    pub fn slot(&self, field: &str) -> Option<KeySlot> {
        if field == self.primary_key {
            return Some(KeySlot::Primary);
        }
        if let Some(position) = self.unique_keys.iter().position(|k| k == field) {
            return Some(KeySlot::Unique(position));
        }
        if let Some((position, _)) = self.scalar_indexes().find(|(_, d)| d.name == field) {
            return Some(KeySlot::Scalar(position));
        }
        if self.list_indexes().any(|d| d.name == field) {
            return Some(KeySlot::List);
        }
        None
    }

    pub fn slot_or_err(&self, field: &str) -> Result<KeySlot> {
        self.slot(field).ok_or_else(|| Error::new(
            ErrorKind::UnknownIndexKey,
            format!("'{}' is not a key or index of {}", field, self.type_name),
        ))
    }

    /// Reject duplicated field names before any store is built on the schema
    pub fn check(&self) -> Result<()> {
        let mut names: Vec<&str> = vec![self.primary_key.as_str()];
        names.extend(self.unique_keys.iter().map(String::as_str));
        names.extend(self.indexes.iter().map(|d| d.name.as_str()));

        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("Empty field name in schema of {}", self.type_name),
                ));
            }
            if names[..i].contains(name) {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("Field '{}' declared twice in schema of {}", name, self.type_name),
                ));
            }
        }
        Ok(())
    }

    /// Validate a record against this schema without touching any store
    pub fn validate(&self, record: &Record) -> Result<()> {
        if record.type_name != self.type_name {
            return Err(Error::new(
                ErrorKind::TypeMismatch,
                format!("Expected {} but got {}", self.type_name, record.type_name),
            ));
        }
        if record.primary_key.is_null() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("Null primary key for {}", self.type_name),
            ));
        }
        if record.unique_keys.len() != self.unique_keys.len() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("Expected {} unique keys, got {}", self.unique_keys.len(), record.unique_keys.len()),
            ));
        }
        if let Some(position) = record.unique_keys.iter().position(KeyValue::is_null) {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("Null value for unique key '{}'", self.unique_keys[position]),
            ));
        }
        let expected = self.scalar_index_count();
        if record.index_keys.len() != expected {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("Expected {} index keys, got {}", expected, record.index_keys.len()),
            ));
        }
        for (name, _) in &record.list_index_keys {
            if !self.list_indexes().any(|d| &d.name == name) {
                return Err(Error::new(
                    ErrorKind::UnknownIndexKey,
                    format!("'{}' is not a list index of {}", name, self.type_name),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_schema() -> CollectionSchema {
        CollectionSchema::new("Trade", "id")
            .add_unique_key("reference")
            .add_ordered_index("amount")
            .add_list_index("tags")
            .add_dictionary_index("desk")
    }

    #[test]
    fn test_slots_follow_declaration_order() {
        let schema = trade_schema();
        assert_eq!(schema.slot("id"), Some(KeySlot::Primary));
        assert_eq!(schema.slot("reference"), Some(KeySlot::Unique(0)));
        assert_eq!(schema.slot("amount"), Some(KeySlot::Scalar(0)));
        // list indexes do not take a scalar position
        assert_eq!(schema.slot("desk"), Some(KeySlot::Scalar(1)));
        assert_eq!(schema.slot("tags"), Some(KeySlot::List));
        assert_eq!(schema.slot("nope"), None);
    }

    #[test]
    fn test_validate() {
        let schema = trade_schema();
        let ok = Record::new("Trade", 1)
            .with_unique_key("T-1")
            .with_index_key(10)
            .with_index_key("london")
            .with_list_value("tags", "fx");
        assert!(schema.validate(&ok).is_ok());

        let wrong_type = Record::new("Quote", 1);
        assert_eq!(schema.validate(&wrong_type).unwrap_err().kind, ErrorKind::TypeMismatch);

        let missing_keys = Record::new("Trade", 1).with_unique_key("T-1");
        assert_eq!(schema.validate(&missing_keys).unwrap_err().kind, ErrorKind::InvalidArgument);

        let unknown_list = ok.clone().with_list_value("colors", "red");
        assert_eq!(schema.validate(&unknown_list).unwrap_err().kind, ErrorKind::UnknownIndexKey);
    }

    #[test]
    fn test_check_rejects_duplicate_names() {
        let schema = CollectionSchema::new("Trade", "id").add_ordered_index("id");
        assert!(schema.check().is_err());
        assert!(trade_schema().check().is_ok());
    }
}
