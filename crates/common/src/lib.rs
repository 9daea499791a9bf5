#[cfg(test)]
mod tests;

pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, io, path::PathBuf, time::Duration};
use thiserror::Error;
use types::Value;

/// Size in bytes of a page, including its header. Fixed by the wire format —
/// not a tunable, since the on-disk header layout bakes in 4096-byte pages.
pub const PAGE_SIZE: usize = 4096;

/// Identifier for a column within a table schema.
pub type ColumnId = u16;

/// Identifier for a table registered in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableId(pub u64);

/// Record identifier: the page holding the record and the byte offset (from
/// the start of the page, i.e. including the 80-byte header) at which the
/// record's tombstone byte begins. Unlike a slot index, this offset is only
/// stable until the next page rewrite (UPDATE/DELETE compaction) — index
/// entries built from a `RecordId` are refreshed at that point per the
/// engine's documented best-effort index maintenance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId {
    pub page_id: u32,
    pub offset: u32,
}

/// Positional row representation backed by `types::Value`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
    #[serde(skip)]
    #[serde(default)]
    rid: Option<RecordId>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values, rid: None }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(values)
    }

    pub fn with_rid(mut self, rid: RecordId) -> Self {
        self.rid = Some(rid);
        self
    }

    pub fn set_rid(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }

    pub fn rid(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::new(values)
    }
}

/// Named projection of a row keyed by column name.
pub type RowMap = HashMap<String, Value>;

/// Rectangular result set carrying column labels and rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Canonical error type shared across database subsystems.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("lex: {0}")]
    Lex(String),
    #[error("parse: {message} (line {line}, column {column}, expected {expected})")]
    Parse {
        message: String,
        line: usize,
        column: usize,
        expected: String,
    },
    #[error("semantic: {0}")]
    Semantic(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("exec: {0}")]
    Execution(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Buffer cache eviction policy. See `buffer::BufferCache`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionPolicy {
    Lru,
    Fifo,
    Lrfu,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        EvictionPolicy::Lru
    }
}

/// Runtime configuration for the database components.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .path(PathBuf::from("./my_db.heap"))
///     .buffer_pool_pages(64)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Path to the single heap file backing the database.
    #[builder(default = PathBuf::from("./database.heap"))]
    pub path: PathBuf,
    /// Number of pages the buffer pool keeps resident.
    #[builder(default = 256)]
    pub buffer_pool_pages: usize,
    /// Eviction policy used once the pool is at capacity.
    #[builder(default)]
    pub eviction_policy: EvictionPolicy,
    /// Decay factor used by the LRFU policy, in (0, 1).
    #[builder(default = 0.5)]
    pub lrfu_decay: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./database.heap"),
            buffer_pool_pages: 256,
            eviction_policy: EvictionPolicy::Lru,
            lrfu_decay: 0.5,
        }
    }
}

/// Execution statistics collected while a statement runs.
#[derive(Clone, Debug, Default)]
pub struct ExecutionStats {
    pub open_time: Duration,
    pub total_next_time: Duration,
    pub close_time: Duration,
    pub rows_produced: u64,
    pub rows_filtered: u64,
    pub pages_scanned: u64,
}

impl ExecutionStats {
    pub fn total_time(&self) -> Duration {
        self.open_time + self.total_next_time + self.close_time
    }

    pub fn format_duration(d: Duration) -> String {
        let micros = d.as_micros();
        if micros < 1000 {
            format!("{micros}µs")
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1000.0)
        } else {
            format!("{:.3}s", micros as f64 / 1_000_000.0)
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DbError, DbResult, ExecutionStats, RecordBatch, Row, RowMap};
    pub use types::{SqlType, Value};
}
