//! Column schema and the record codec described in §4.4: a leading
//! tombstone byte followed by one fixed- or length-prefixed field per
//! column, in schema order.

use common::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use types::{SqlType, Value};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: SqlType,
    pub nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: SqlType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }
}

/// An ordered, validated set of columns. Column order is significant for
/// serialization; names are unique within a table (case-sensitive).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    pub fn try_new(columns: Vec<ColumnInfo>) -> DbResult<Self> {
        if columns.is_empty() {
            return Err(DbError::Semantic("table must have at least one column".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DbError::Semantic(format!("duplicate column '{}'", col.name)));
            }
        }
        Ok(Self { columns })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn type_of(&self, name: &str) -> Option<SqlType> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.data_type)
    }

    pub fn encoded_len(&self, values: &[Value]) -> DbResult<usize> {
        let mut len = 1; // tombstone byte
        for (col, val) in self.columns.iter().zip(values) {
            len += field_len(col.data_type, val)?;
        }
        Ok(len)
    }
}

fn field_len(ty: SqlType, value: &Value) -> DbResult<usize> {
    match (ty, value) {
        (SqlType::Int, Value::Int(_)) | (SqlType::Int, Value::Null) => Ok(4),
        (SqlType::Varchar, Value::Text(s)) => Ok(4 + s.as_bytes().len()),
        (SqlType::Varchar, Value::Null) => Ok(4),
        (ty, val) => Err(DbError::Storage(format!(
            "value {val:?} does not match column type {ty}"
        ))),
    }
}

/// Encodes `values` (ordered per `schema`) as a tombstone byte plus one
/// field per column.
pub fn encode_record(values: &[Value], is_deleted: bool, schema: &TableSchema) -> DbResult<Vec<u8>> {
    if values.len() != schema.columns.len() {
        return Err(DbError::Semantic(format!(
            "expected {} values, got {}",
            schema.columns.len(),
            values.len()
        )));
    }
    let mut buf = Vec::with_capacity(schema.encoded_len(values)?);
    buf.push(is_deleted as u8);
    for (col, val) in schema.columns.iter().zip(values) {
        match (col.data_type, val) {
            (SqlType::Int, Value::Int(i)) => buf.extend_from_slice(&i.to_be_bytes()),
            (SqlType::Int, Value::Null) => buf.extend_from_slice(&0i32.to_be_bytes()),
            (SqlType::Varchar, Value::Text(s)) => {
                let bytes = s.as_bytes();
                buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                buf.extend_from_slice(bytes);
            }
            (SqlType::Varchar, Value::Null) => buf.extend_from_slice(&0u32.to_be_bytes()),
            (ty, val) => {
                return Err(DbError::Storage(format!(
                    "value {val:?} does not match column type {ty}"
                )));
            }
        }
    }
    Ok(buf)
}

/// Decodes a single record from `bytes` starting at `offset`. Returns the
/// decoded values, its tombstone flag, and the number of bytes consumed.
pub fn decode_record(bytes: &[u8], offset: usize, schema: &TableSchema) -> DbResult<(Vec<Value>, bool, usize)> {
    let mut pos = offset;
    let is_deleted = *bytes
        .get(pos)
        .ok_or_else(|| DbError::Storage("truncated record: missing tombstone byte".into()))?
        != 0;
    pos += 1;

    let mut values = Vec::with_capacity(schema.columns.len());
    for col in &schema.columns {
        match col.data_type {
            SqlType::Int => {
                let raw: [u8; 4] = bytes
                    .get(pos..pos + 4)
                    .ok_or_else(|| DbError::Storage("truncated INT field".into()))?
                    .try_into()
                    .unwrap();
                let i = i32::from_be_bytes(raw);
                values.push(if i == 0 { Value::Null } else { Value::Int(i) });
                pos += 4;
            }
            SqlType::Varchar => {
                let raw: [u8; 4] = bytes
                    .get(pos..pos + 4)
                    .ok_or_else(|| DbError::Storage("truncated VARCHAR length".into()))?
                    .try_into()
                    .unwrap();
                let len = u32::from_be_bytes(raw) as usize;
                pos += 4;
                if len == 0 {
                    values.push(Value::Null);
                } else {
                    let raw = bytes
                        .get(pos..pos + len)
                        .ok_or_else(|| DbError::Storage("truncated VARCHAR payload".into()))?;
                    let s = std::str::from_utf8(raw)
                        .map_err(|e| DbError::Storage(format!("invalid utf8 in VARCHAR field: {e}")))?;
                    values.push(Value::Text(s.to_string()));
                    pos += len;
                }
            }
        }
    }
    Ok((values, is_deleted, pos - offset))
}
