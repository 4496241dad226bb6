//! Scalar values bound as statement parameters, and the ordered field map
//! carried by update requests.

use crate::error::{JoblyError, JoblyResult};
use bytes::BytesMut;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// Column names starting with this prefix carry transport metadata (e.g. `_token`)
/// and are never written to storage.
pub const RESERVED_PREFIX: char = '_';

/// Whether `name` is a reserved transport field.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// A scalar value the storage layer accepts.
///
/// Binding adapts to the target column: an `Int` can be written to any integer
/// column it fits in and to float columns; a `Float` to float columns; `Null`
/// to anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(i) => Some(i as f64),
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Null => "null",
        }
    }

    /// Convert a JSON scalar. Arrays and objects are rejected.
    pub fn from_json(value: serde_json::Value) -> JoblyResult<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n.as_f64().map(Value::Float).ok_or_else(|| {
                    JoblyError::invalid_argument(format!("number {n} is out of range"))
                }),
            },
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => Err(
                JoblyError::invalid_argument(format!("expected a scalar value, got {other}")),
            ),
        }
    }
}

fn mismatch(value: &Value, ty: &Type) -> Box<dyn Error + Sync + Send> {
    format!("cannot bind {} value to column of type {}", value.kind(), ty).into()
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Text(s) if <&str as ToSql>::accepts(ty) => s.as_str().to_sql(ty, out),
            Value::Bool(b) if <bool as ToSql>::accepts(ty) => b.to_sql(ty, out),
            Value::Int(i) => {
                if *ty == Type::INT8 {
                    i.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*i)?.to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    i16::try_from(*i)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*i as f64).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*i as f32).to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            Value::Float(f) => {
                if *ty == Type::FLOAT8 {
                    f.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*f as f32).to_sql(ty, out)
                } else {
                    Err(mismatch(self, ty))
                }
            }
            _ => Err(mismatch(self, ty)),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Ordered mapping from column name to new value.
///
/// Iteration follows insertion order. Inserting a name that is already present
/// replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateFields {
    entries: Vec<(String, Value)>,
}

impl UpdateFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Builder form of [`UpdateFields::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Look up a reserved (`_`-prefixed) transport field.
    pub fn reserved(&self, name: &str) -> Option<&Value> {
        if is_reserved(name) { self.get(name) } else { None }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order, reserved ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Entries that name real columns, in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(name, _)| !is_reserved(name))
    }

    /// Build from a JSON object, preserving key order.
    pub fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> JoblyResult<Self> {
        let mut fields = Self::new();
        for (name, value) in map {
            let value = Value::from_json(value).map_err(|e| {
                JoblyError::invalid_argument(format!("field '{name}': {e}"))
            })?;
            fields.insert(name, value);
        }
        Ok(fields)
    }

    /// Build from a JSON request body, which must be an object.
    pub fn from_json(body: serde_json::Value) -> JoblyResult<Self> {
        match body {
            serde_json::Value::Object(map) => Self::from_json_map(map),
            other => Err(JoblyError::invalid_argument(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for UpdateFields
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl<'de> Deserialize<'de> for UpdateFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(serde::de::Error::custom)
    }
}
