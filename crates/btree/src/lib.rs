//! In-memory B+Tree index (§4.9) used for ordered, range-scannable
//! indexes. Keys live in a flat arena addressed by `NodeHandle`; there are
//! no parent pointers, so insertion recurses down from the root and any
//! split bubbles back up through the return value.

mod node;

pub use node::{Node, NodeHandle, NodeType};

use common::{DbError, DbResult, RecordId};
use types::Value;

/// Default branching factor (max keys per node) when none is specified.
pub const DEFAULT_ORDER: usize = 3;

/// Orders two keys, treating `NULL` as less than every non-null value of
/// any type. `insert` never stores a `NULL` key (see `check_key_type`), so
/// this only matters for a `NULL` lookup key passed to `search`/`delete` —
/// which then simply finds nothing, rather than panicking.
fn key_cmp(a: &Value, b: &Value) -> std::cmp::Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        (false, false) => a
            .cmp_same_type(b)
            .expect("btree keys for a single index are always the same SQL type"),
    }
}

#[derive(Debug)]
pub struct BPlusTree {
    arena: Vec<Node>,
    root: NodeHandle,
    order: usize,
    size: usize,
}

impl BPlusTree {
    pub fn new(order: usize) -> Self {
        assert!(order >= 2, "branching factor must be at least 2");
        Self {
            arena: vec![Node::new_leaf()],
            root: 0,
            order,
            size: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn search(&self, key: &Value) -> Vec<RecordId> {
        let leaf = self.find_leaf(key);
        match &self.arena[leaf] {
            Node::Leaf { entries, .. } => entries
                .iter()
                .filter(|(k, _)| key_cmp(k, key) == std::cmp::Ordering::Equal)
                .map(|(_, rid)| *rid)
                .collect(),
            Node::Internal { .. } => unreachable!("find_leaf always returns a leaf"),
        }
    }

    pub fn range_scan(&self, low: Option<&Value>, high: Option<&Value>) -> Vec<RecordId> {
        let mut handle = match low {
            Some(key) => self.find_leaf(key),
            None => self.leftmost_leaf(),
        };
        let mut results = Vec::new();

        loop {
            let (entries, next) = match &self.arena[handle] {
                Node::Leaf { entries, next_leaf } => (entries, *next_leaf),
                Node::Internal { .. } => unreachable!("descent always lands on a leaf"),
            };

            for (k, rid) in entries {
                if let Some(lo) = low {
                    if key_cmp(k, lo) == std::cmp::Ordering::Less {
                        continue;
                    }
                }
                if let Some(hi) = high {
                    if key_cmp(k, hi) == std::cmp::Ordering::Greater {
                        return results;
                    }
                }
                results.push(*rid);
            }

            match next {
                Some(n) => handle = n,
                None => return results,
            }
        }
    }

    pub fn scan_all(&self) -> Vec<(Value, RecordId)> {
        let mut handle = self.leftmost_leaf();
        let mut results = Vec::new();
        loop {
            let (entries, next) = match &self.arena[handle] {
                Node::Leaf { entries, next_leaf } => (entries.clone(), *next_leaf),
                Node::Internal { .. } => unreachable!("descent always lands on a leaf"),
            };
            results.extend(entries);
            match next {
                Some(n) => handle = n,
                None => return results,
            }
        }
    }

    pub fn insert(&mut self, key: Value, rid: RecordId) -> DbResult<()> {
        check_key_type(&key)?;
        if let Some((split_key, new_child)) = self.insert_recursive(self.root, key, rid)? {
            let new_root = Node::Internal {
                keys: vec![split_key],
                children: vec![self.root, new_child],
            };
            self.root = self.push(new_root);
        }
        self.size += 1;
        Ok(())
    }

    /// Removes one matching (key, rid) entry from its leaf. Does not
    /// rebalance — an underflowed leaf is left as-is, matching this index's
    /// append-and-scan usage pattern.
    pub fn delete(&mut self, key: &Value, rid: RecordId) -> bool {
        let leaf = self.find_leaf(key);
        match &mut self.arena[leaf] {
            Node::Leaf { entries, .. } => {
                let before = entries.len();
                let mut removed = false;
                entries.retain(|(k, r)| {
                    if !removed && key_cmp(k, key) == std::cmp::Ordering::Equal && *r == rid {
                        removed = true;
                        false
                    } else {
                        true
                    }
                });
                if entries.len() < before {
                    self.size -= 1;
                    true
                } else {
                    false
                }
            }
            Node::Internal { .. } => unreachable!("find_leaf always returns a leaf"),
        }
    }

    fn push(&mut self, node: Node) -> NodeHandle {
        self.arena.push(node);
        self.arena.len() - 1
    }

    fn leftmost_leaf(&self) -> NodeHandle {
        let mut handle = self.root;
        loop {
            match &self.arena[handle] {
                Node::Internal { children, .. } => handle = children[0],
                Node::Leaf { .. } => return handle,
            }
        }
    }

    fn find_leaf(&self, key: &Value) -> NodeHandle {
        let mut handle = self.root;
        loop {
            match &self.arena[handle] {
                Node::Internal { keys, children } => {
                    let idx = keys.partition_point(|k| key_cmp(k, key) != std::cmp::Ordering::Greater);
                    handle = children[idx];
                }
                Node::Leaf { .. } => return handle,
            }
        }
    }

    fn insert_recursive(
        &mut self,
        handle: NodeHandle,
        key: Value,
        rid: RecordId,
    ) -> DbResult<Option<(Value, NodeHandle)>> {
        match self.arena[handle].clone() {
            Node::Internal { keys, children } => {
                let idx = keys.partition_point(|k| key_cmp(k, &key) != std::cmp::Ordering::Greater);
                let child = children[idx];
                let split = self.insert_recursive(child, key, rid)?;

                let Some((split_key, new_child)) = split else {
                    return Ok(None);
                };

                let mut new_keys = keys;
                let mut new_children = children;
                new_keys.insert(idx, split_key);
                new_children.insert(idx + 1, new_child);

                if new_keys.len() > self.order {
                    let mid = new_keys.len() / 2;
                    let promoted = new_keys[mid].clone();
                    let right_keys = new_keys.split_off(mid + 1);
                    new_keys.truncate(mid);
                    let right_children = new_children.split_off(mid + 1);

                    self.arena[handle] = Node::Internal {
                        keys: new_keys,
                        children: new_children,
                    };
                    let right_handle = self.push(Node::Internal {
                        keys: right_keys,
                        children: right_children,
                    });
                    Ok(Some((promoted, right_handle)))
                } else {
                    self.arena[handle] = Node::Internal {
                        keys: new_keys,
                        children: new_children,
                    };
                    Ok(None)
                }
            }
            Node::Leaf { mut entries, next_leaf } => {
                let idx = entries.partition_point(|(k, _)| key_cmp(k, &key) != std::cmp::Ordering::Greater);
                entries.insert(idx, (key, rid));

                if entries.len() > self.order {
                    let mid = entries.len() / 2;
                    let right_entries = entries.split_off(mid);
                    let split_key = right_entries[0].0.clone();

                    let right_handle = self.push(Node::Leaf {
                        entries: right_entries,
                        next_leaf,
                    });
                    self.arena[handle] = Node::Leaf {
                        entries,
                        next_leaf: Some(right_handle),
                    };
                    Ok(Some((split_key, right_handle)))
                } else {
                    self.arena[handle] = Node::Leaf { entries, next_leaf };
                    Ok(None)
                }
            }
        }
    }
}

impl Default for BPlusTree {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

pub fn check_key_type(key: &Value) -> DbResult<()> {
    if key.is_null() {
        return Err(DbError::Constraint("index key cannot be NULL".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests;
