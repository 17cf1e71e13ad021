use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Scalar used as primary key, unique key and index key.
///
/// Integers and floats share one numeric domain: `Float(1000.0) == Integer(1000)`
/// and both hash the same. Strings, booleans and dates only compare within their
/// own kind; across kinds the order falls back to a fixed kind rank so that a
/// sorted index always sees a total order. `Null` sorts before everything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyValue {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(i64),      // microseconds since the Unix epoch
    String(String),
}

// i64::MIN as f64 is exact; i64::MAX as f64 rounds up to 2^63
const I64_LOWER_AS_F64: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER_AS_F64: f64 = 9_223_372_036_854_775_808.0;

fn exact_integer(value: f64) -> Option<i64> {
    if value.fract() == 0.0 && value >= I64_LOWER_AS_F64 && value < I64_UPPER_AS_F64 {
        Some(value as i64)
    } else {
        None
    }
}

fn compare_integer_float(integer: i64, float: f64) -> Ordering {
    if float.is_nan() {
        return if float.is_sign_negative() { Ordering::Greater } else { Ordering::Less };
    }
    if let Some(exact) = exact_integer(float) {
        return integer.cmp(&exact);
    }
    if float >= I64_UPPER_AS_F64 {
        return Ordering::Less;
    }
    if float < I64_LOWER_AS_F64 {
        return Ordering::Greater;
    }
    // non-integral and inside the i64 range: never equal
    (integer as f64).total_cmp(&float)
}

impl KeyValue {
    pub fn date(value: DateTime<Utc>) -> Self {
        KeyValue::Date(value.timestamp_micros())
    }

    /// Convert a JSON scalar. Arrays and objects have no key representation.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(KeyValue::Null),
            serde_json::Value::Bool(b) => Ok(KeyValue::Boolean(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(KeyValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(KeyValue::Float(f))
                } else {
                    Err(Error::new(
                        ErrorKind::UnsupportedKeyType,
                        format!("Number {} cannot be used as a key", n),
                    ))
                }
            }
            serde_json::Value::String(s) => Ok(KeyValue::String(s.clone())),
            other => Err(Error::new(
                ErrorKind::UnsupportedKeyType,
                format!("JSON value {} cannot be used as a key", other),
            )),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, KeyValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            KeyValue::Integer(i) => Some(*i),
            KeyValue::Float(f) => exact_integer(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Equality as seen by queries: `Null` never equals anything, itself included.
    pub fn query_eq(&self, other: &KeyValue) -> bool {
        !self.is_null() && !other.is_null() && self == other
    }

    fn kind_rank(&self) -> u8 {
        match self {
            KeyValue::Null => 0,
            KeyValue::Integer(_) | KeyValue::Float(_) => 1,
            KeyValue::Boolean(_) => 2,
            KeyValue::Date(_) => 3,
            KeyValue::String(_) => 4,
        }
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use KeyValue::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => {
                if a == b { Ordering::Equal } else { a.total_cmp(b) }
            }
            (Integer(a), Float(b)) => compare_integer_float(*a, *b),
            (Float(a), Integer(b)) => compare_integer_float(*b, *a).reverse(),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            KeyValue::Null => {}
            KeyValue::Integer(i) => i.hash(state),
            KeyValue::Float(f) => match exact_integer(*f) {
                Some(i) => i.hash(state),
                None => f.to_bits().hash(state),
            },
            KeyValue::Boolean(b) => b.hash(state),
            KeyValue::Date(d) => d.hash(state),
            KeyValue::String(s) => s.hash(state),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeyValue::Null => write!(f, "null"),
            KeyValue::Integer(i) => write!(f, "{}", i),
            KeyValue::Float(v) => write!(f, "{}", v),
            KeyValue::Boolean(b) => write!(f, "{}", b),
            KeyValue::Date(d) => match DateTime::<Utc>::from_timestamp_micros(*d) {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "date({})", d),
            },
            KeyValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Integer(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Integer(value as i64)
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        KeyValue::Float(value)
    }
}

impl From<bool> for KeyValue {
    fn from(value: bool) -> Self {
        KeyValue::Boolean(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(value: DateTime<Utc>) -> Self {
        KeyValue::date(value)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(KeyValue::Null)
    }
}

/// Denormalized row held by a store.
///
/// Scalar index keys follow the order in which the schema declares its indexes.
/// List index keys are flattened `(index name, value)` pairs, so one record can
/// carry several values for the same list index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub type_name: String,
    pub primary_key: KeyValue,
    pub unique_keys: Vec<KeyValue>,
    pub index_keys: Vec<KeyValue>,
    pub list_index_keys: Vec<(String, KeyValue)>,
    pub full_text: Vec<String>,
    pub payload: Bytes,
}

impl Record {
    pub fn new(type_name: &str, primary_key: impl Into<KeyValue>) -> Self {
        Record {
            type_name: type_name.to_string(),
            primary_key: primary_key.into(),
            unique_keys: Vec::new(),
            index_keys: Vec::new(),
            list_index_keys: Vec::new(),
            full_text: Vec::new(),
            payload: Bytes::new(),
        }
    }

    pub fn with_unique_key(mut self, value: impl Into<KeyValue>) -> Self {
        self.unique_keys.push(value.into());
        self
    }

    pub fn with_index_key(mut self, value: impl Into<KeyValue>) -> Self {
        self.index_keys.push(value.into());
        self
    }

    pub fn with_list_value(mut self, index_name: &str, value: impl Into<KeyValue>) -> Self {
        self.list_index_keys.push((index_name.to_string(), value.into()));
        self
    }

    pub fn with_full_text(mut self, line: &str) -> Self {
        self.full_text.push(line.to_string());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Values stored under a list index, duplicates removed.
    pub fn list_values(&self, index_name: &str) -> Vec<&KeyValue> {
        let mut values: Vec<&KeyValue> = Vec::new();
        for (name, value) in &self.list_index_keys {
            if name == index_name && !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }
}
