//! Scalar value and column-type vocabulary shared by every layer of the engine.

use std::cmp::Ordering;
use std::fmt;

/// A column's declared storage type. The dialect supports exactly two: a
/// 4-byte signed integer and a length-prefixed UTF-8 string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    Int,
    Varchar,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Int => "INT",
            SqlType::Varchar => "VARCHAR",
        }
    }

    pub fn parse(s: &str) -> Option<SqlType> {
        match s.to_ascii_uppercase().as_str() {
            "INT" => Some(SqlType::Int),
            "VARCHAR" => Some(SqlType::Varchar),
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A runtime scalar. `Null` is the only value shared across types; comparisons
/// and arithmetic between `Int` and `Text` are never performed directly —
/// callers coerce against a column's declared `SqlType` first (see `expr`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Int(i32),
    Text(String),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Value::Int(_) => Some(SqlType::Int),
            Value::Text(_) => Some(SqlType::Varchar),
            Value::Null => None,
        }
    }

    /// Compares two values of the same runtime variant. Cross-type
    /// comparisons (and anything involving `Null`) return `None`; the
    /// dialect has no three-valued logic beyond pass-through.
    pub fn cmp_same_type(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn eq_same_type(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.eq(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.eq(b)),
            _ => None,
        }
    }

    /// Coerces a literal value to `ty`, attempting a digit parse in either
    /// direction. Returns `None` if the value cannot be represented as `ty`.
    pub fn coerce_to(&self, ty: SqlType) -> Option<Value> {
        match (self, ty) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Int(i), SqlType::Int) => Some(Value::Int(*i)),
            (Value::Text(s), SqlType::Varchar) => Some(Value::Text(s.clone())),
            (Value::Text(s), SqlType::Int) => s.parse::<i32>().ok().map(Value::Int),
            (Value::Int(i), SqlType::Varchar) => Some(Value::Text(i.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "NULL"),
        }
    }
}
