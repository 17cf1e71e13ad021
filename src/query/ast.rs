use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::KeyValue;

/// Comparison operators understood by indexes and the record matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOperator {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Between, // inclusive on both ends
    In,
}

impl QueryOperator {
    pub fn is_equality(&self) -> bool {
        matches!(self, QueryOperator::Eq | QueryOperator::In)
    }

    /// Validate the number of values an operator is applied to.
    ///
    /// `In` takes one or more values, `Between` exactly two, every other
    /// operator exactly one.
    pub fn check_arity(&self, values: &[KeyValue]) -> Result<()> {
        if values.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("{:?} needs at least one value", self),
            ));
        }
        let valid = match self {
            QueryOperator::In => true,
            QueryOperator::Between => values.len() == 2,
            _ => values.len() == 1,
        };
        if !valid {
            return Err(Error::new(
                ErrorKind::InvalidIndexQuery,
                format!("{:?} cannot be applied to {} values", self, values.len()),
            ));
        }
        Ok(())
    }
}

/// Single predicate on one key or index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicQuery {
    pub field: String,
    pub operator: QueryOperator,
    pub values: Vec<KeyValue>,
}

impl AtomicQuery {
    pub fn new(field: &str, operator: QueryOperator, values: Vec<KeyValue>) -> Self {
        AtomicQuery {
            field: field.to_string(),
            operator,
            values,
        }
    }

    pub fn eq(field: &str, value: impl Into<KeyValue>) -> Self {
        Self::new(field, QueryOperator::Eq, vec![value.into()])
    }

    pub fn lt(field: &str, value: impl Into<KeyValue>) -> Self {
        Self::new(field, QueryOperator::Lt, vec![value.into()])
    }

    pub fn le(field: &str, value: impl Into<KeyValue>) -> Self {
        Self::new(field, QueryOperator::Le, vec![value.into()])
    }

    pub fn gt(field: &str, value: impl Into<KeyValue>) -> Self {
        Self::new(field, QueryOperator::Gt, vec![value.into()])
    }

    pub fn ge(field: &str, value: impl Into<KeyValue>) -> Self {
        Self::new(field, QueryOperator::Ge, vec![value.into()])
    }

    pub fn between(field: &str, low: impl Into<KeyValue>, high: impl Into<KeyValue>) -> Self {
        Self::new(field, QueryOperator::Between, vec![low.into(), high.into()])
    }

    pub fn in_values<V: Into<KeyValue>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(field, QueryOperator::In, values.into_iter().map(Into::into).collect())
    }

    /// Whether a single stored value satisfies this predicate
    pub fn matches_value(&self, value: &KeyValue) -> bool {
        match self.operator {
            QueryOperator::Eq => self.values.first().is_some_and(|v| value.query_eq(v)),
            QueryOperator::In => self.values.iter().any(|v| value.query_eq(v)),
            QueryOperator::Lt => self.values.first().is_some_and(|v| value < v),
            QueryOperator::Le => self.values.first().is_some_and(|v| value <= v),
            QueryOperator::Gt => self.values.first().is_some_and(|v| value > v),
            QueryOperator::Ge => self.values.first().is_some_and(|v| value >= v),
            QueryOperator::Between => match self.values.as_slice() {
                [low, high] => value >= low && value <= high,
                _ => false,
            },
        }
    }
}

/// Conjunction of atomic predicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndQuery {
    pub elements: Vec<AtomicQuery>,
}

impl AndQuery {
    pub fn new() -> Self {
        AndQuery { elements: Vec::new() }
    }

    pub fn with(mut self, query: AtomicQuery) -> Self {
        self.elements.push(query);
        self
    }

    /// True when every predicate of `other` is also part of this conjunction,
    /// i.e. this query selects a subset of what `other` selects.
    pub fn is_subset_of(&self, other: &AndQuery) -> bool {
        other.elements.iter().all(|e| self.elements.contains(e))
    }
}

/// Disjunction of conjunctions, optionally combined with a full-text term
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrQuery {
    pub elements: Vec<AndQuery>,
    pub take: Option<usize>,
    pub full_text: Option<String>,
}

impl OrQuery {
    pub fn new() -> Self {
        OrQuery::default()
    }

    /// Query matching every record
    pub fn all() -> Self {
        OrQuery::default()
    }

    pub fn with(mut self, query: AndQuery) -> Self {
        self.elements.push(query);
        self
    }

    pub fn with_take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    pub fn with_full_text(mut self, text: &str) -> Self {
        self.full_text = Some(text.to_string());
        self
    }

    pub fn single(query: AtomicQuery) -> Self {
        OrQuery::new().with(AndQuery::new().with(query))
    }

    pub fn has_predicates(&self) -> bool {
        self.elements.iter().any(|and| !and.elements.is_empty())
    }

    pub fn has_full_text(&self) -> bool {
        self.full_text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        let one = [KeyValue::from(1)];
        let two = [KeyValue::from(1), KeyValue::from(2)];

        assert!(QueryOperator::Eq.check_arity(&one).is_ok());
        assert!(QueryOperator::Between.check_arity(&two).is_ok());
        assert!(QueryOperator::In.check_arity(&two).is_ok());

        assert_eq!(QueryOperator::Eq.check_arity(&[]).unwrap_err().kind, ErrorKind::InvalidArgument);
        assert_eq!(QueryOperator::Ge.check_arity(&two).unwrap_err().kind, ErrorKind::InvalidIndexQuery);
        assert_eq!(QueryOperator::Between.check_arity(&one).unwrap_err().kind, ErrorKind::InvalidIndexQuery);
    }

    #[test]
    fn test_matches_value() {
        let between = AtomicQuery::between("amount", 10, 20);
        assert!(between.matches_value(&KeyValue::from(10)));
        assert!(between.matches_value(&KeyValue::Float(20.0)));
        assert!(!between.matches_value(&KeyValue::from(21)));

        let eq_null = AtomicQuery::eq("amount", KeyValue::Null);
        assert!(!eq_null.matches_value(&KeyValue::Null));

        assert!(AtomicQuery::lt("amount", 0).matches_value(&KeyValue::Null));
    }

    #[test]
    fn test_subset() {
        let broad = AndQuery::new().with(AtomicQuery::eq("desk", "london"));
        let narrow = broad.clone().with(AtomicQuery::gt("amount", 100));
        assert!(narrow.is_subset_of(&broad));
        assert!(!broad.is_subset_of(&narrow));
    }
}
