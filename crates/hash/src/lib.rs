//! In-memory hash index (§4.9) for equality-only lookups. Separate chaining
//! over a growable bucket vector, doubling and fully rehashing once the load
//! factor crosses 0.75 — unlike the B+Tree, this index has no on-disk
//! representation and no ordering guarantee, so it only serves `=`
//! predicates.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use common::{DbError, DbResult, RecordId};
use types::Value;

const INITIAL_BUCKET_COUNT: usize = 16;
const LOAD_FACTOR: f64 = 0.75;

fn hashable_key(key: &Value) -> DbResult<u64> {
    let mut hasher = DefaultHasher::new();
    match key {
        Value::Int(i) => {
            0u8.hash(&mut hasher);
            i.hash(&mut hasher);
        }
        Value::Text(s) => {
            1u8.hash(&mut hasher);
            s.hash(&mut hasher);
        }
        Value::Null => return Err(DbError::Constraint("index key cannot be NULL".into())),
    }
    Ok(hasher.finish())
}

/// Growable separate-chaining hash index. A key may map to more than one
/// `RecordId` — uniqueness, where required, is enforced by the catalog at
/// insert time, not by this structure.
#[derive(Debug)]
pub struct HashIndex {
    buckets: Vec<Vec<(Value, RecordId)>>,
    count: usize,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::with_bucket_count(INITIAL_BUCKET_COUNT)
    }

    fn with_bucket_count(n: usize) -> Self {
        Self {
            buckets: (0..n).map(|_| Vec::new()).collect(),
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn bucket_index(&self, key: &Value) -> DbResult<usize> {
        Ok((hashable_key(key)? % self.buckets.len() as u64) as usize)
    }

    fn resize(&mut self) {
        let old_buckets = std::mem::take(&mut self.buckets);
        self.buckets = (0..old_buckets.len() * 2).map(|_| Vec::new()).collect();
        self.count = 0;
        for bucket in old_buckets {
            for (key, rid) in bucket {
                // Capacity was just doubled, so this cannot trigger a
                // further resize or a hash-key error on a key that was
                // already validated on its original insert.
                self.insert(key, rid).expect("rehash of an already-valid key cannot fail");
            }
        }
    }

    pub fn insert(&mut self, key: Value, rid: RecordId) -> DbResult<()> {
        if (self.count + 1) as f64 >= self.buckets.len() as f64 * LOAD_FACTOR {
            self.resize();
        }
        let idx = self.bucket_index(&key)?;
        self.buckets[idx].push((key, rid));
        self.count += 1;
        Ok(())
    }

    pub fn search(&self, key: &Value) -> DbResult<Vec<RecordId>> {
        let idx = self.bucket_index(key)?;
        Ok(self.buckets[idx]
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, rid)| *rid)
            .collect())
    }

    pub fn delete(&mut self, key: &Value, rid: RecordId) -> DbResult<bool> {
        let idx = self.bucket_index(key)?;
        let bucket = &mut self.buckets[idx];
        let before = bucket.len();
        bucket.retain(|(k, r)| !(k == key && *r == rid));
        let removed = bucket.len() < before;
        if removed {
            self.count -= 1;
        }
        Ok(removed)
    }

    pub fn scan_all(&self) -> Vec<(Value, RecordId)> {
        self.buckets.iter().flatten().cloned().collect()
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}
