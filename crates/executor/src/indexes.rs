//! Runtime registry of live index structures (§4.8, §4.9).
//!
//! The catalog persists index *metadata* (`pg_indexes`) but never the
//! B+Tree/hash structures themselves — those live only in memory for the
//! life of the process and are rebuilt by a full table scan whenever they're
//! needed fresh: on `CREATE INDEX` and again each time the database crate
//! opens an existing file. Keyed by `(table, column)` since this dialect
//! allows at most one index per column.

use std::collections::HashMap;

use btree::BPlusTree;
use catalog::IndexKind;
use common::{DbResult, RecordId};
use hash::HashIndex;
use types::Value;

pub enum IndexHandle {
    BTree(BPlusTree),
    Hash(HashIndex),
}

impl IndexHandle {
    fn new(kind: &IndexKind) -> Self {
        match kind {
            IndexKind::BTree => IndexHandle::BTree(BPlusTree::default()),
            IndexKind::Hash => IndexHandle::Hash(HashIndex::new()),
        }
    }

    pub fn insert(&mut self, key: Value, rid: RecordId) -> DbResult<()> {
        match self {
            IndexHandle::BTree(t) => t.insert(key, rid),
            IndexHandle::Hash(h) => h.insert(key, rid),
        }
    }

    pub fn search(&self, key: &Value) -> DbResult<Vec<RecordId>> {
        match self {
            IndexHandle::BTree(t) => Ok(t.search(key)),
            IndexHandle::Hash(h) => h.search(key),
        }
    }
}

#[derive(Default)]
pub struct IndexRegistry {
    handles: HashMap<(String, String), IndexHandle>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str, column: &str) -> Option<&IndexHandle> {
        self.handles.get(&(table.to_string(), column.to_string()))
    }

    pub fn get_mut(&mut self, table: &str, column: &str) -> Option<&mut IndexHandle> {
        self.handles.get_mut(&(table.to_string(), column.to_string()))
    }

    pub fn drop_index(&mut self, table: &str, column: &str) {
        self.handles.remove(&(table.to_string(), column.to_string()));
    }

    /// Builds a fresh index over every live row currently in `table` and
    /// installs it, replacing whatever was registered before.
    pub fn rebuild(
        &mut self,
        store: &mut buffer::TableStore,
        table: &str,
        column: &str,
        kind: &IndexKind,
    ) -> DbResult<()> {
        let schema = store.schema(table)?.clone();
        let position = schema
            .position(column)
            .ok_or_else(|| common::DbError::Semantic(format!("unknown column '{column}'")))?;

        let mut handle = IndexHandle::new(kind);
        for row in store.scan(table, None)? {
            let Some(rid) = row.rid() else { continue };
            let value = row.values[position].clone();
            if value.is_null() {
                continue;
            }
            handle.insert(value, rid)?;
        }
        self.handles.insert((table.to_string(), column.to_string()), handle);
        Ok(())
    }
}
