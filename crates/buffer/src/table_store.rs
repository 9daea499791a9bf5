//! Table-level record storage on top of `BufferCache` (§4.7). Grounded in
//! the reference `TableStorage`/`StorageEngine` pair: each table owns an
//! ordered list of data page ids plus a free-space-per-page map, and scans
//! walk that list in ascending page-id order.

use std::collections::HashMap;

use common::{DbError, DbResult, RecordId, Row};
use expr::{EvalContext, Expr};
use storage::{decode_record, encode_record, Page, PageType, TableSchema, HEADER_SIZE, PAYLOAD_SIZE};
use types::Value;

use crate::cache::BufferCache;

struct TableMeta {
    schema: TableSchema,
    data_pages: Vec<u32>,
    free_space: HashMap<u32, u32>,
}

/// Owns every table's data pages and routes record operations through a
/// shared `BufferCache`.
pub struct TableStore {
    cache: BufferCache,
    tables: HashMap<String, TableMeta>,
}

impl TableStore {
    pub fn new(cache: BufferCache) -> Self {
        Self {
            cache,
            tables: HashMap::new(),
        }
    }

    pub fn cache_mut(&mut self) -> &mut BufferCache {
        &mut self.cache
    }

    pub fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn schema(&self, table: &str) -> DbResult<&TableSchema> {
        self.tables
            .get(table)
            .map(|m| &m.schema)
            .ok_or_else(|| DbError::Semantic(format!("table '{table}' does not exist")))
    }

    /// Registers a freshly-created table with no pages yet allocated.
    pub fn create_table(&mut self, table: &str, schema: TableSchema) -> DbResult<()> {
        if self.tables.contains_key(table) {
            return Err(DbError::Semantic(format!("table '{table}' already exists")));
        }
        self.tables.insert(
            table.to_string(),
            TableMeta {
                schema,
                data_pages: Vec::new(),
                free_space: HashMap::new(),
            },
        );
        Ok(())
    }

    /// Re-registers a table whose data pages already exist on disk,
    /// rediscovered by scanning the page file for matching page types and
    /// table names. Used by catalog bootstrap on reopen.
    pub fn attach_existing_table(
        &mut self,
        table: &str,
        schema: TableSchema,
        pages: Vec<Page>,
    ) -> DbResult<()> {
        let mut meta = TableMeta {
            schema,
            data_pages: Vec::new(),
            free_space: HashMap::new(),
        };
        for page in pages {
            if page.page_type == PageType::Data && page.table_name == table {
                meta.free_space.insert(page.page_id, page.free_space);
                meta.data_pages.push(page.page_id);
            }
        }
        meta.data_pages.sort_unstable();
        self.tables.insert(table.to_string(), meta);
        Ok(())
    }

    fn find_page_with_space(meta: &TableMeta, needed: usize) -> Option<u32> {
        meta.data_pages
            .iter()
            .copied()
            .find(|id| meta.free_space.get(id).copied().unwrap_or(0) as usize >= needed)
    }

    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> DbResult<RecordId> {
        let meta = self
            .tables
            .get(table)
            .ok_or_else(|| DbError::Semantic(format!("table '{table}' does not exist")))?;
        let bytes = encode_record(&values, false, &meta.schema)?;

        let page_id = match Self::find_page_with_space(meta, bytes.len()) {
            Some(id) => id,
            None => {
                let id = self.cache.allocate_page(PageType::Data, table)?;
                let meta = self.tables.get_mut(table).unwrap();
                meta.data_pages.push(id);
                meta.free_space.insert(id, PAYLOAD_SIZE as u32);
                id
            }
        };

        let mut page = self.cache.get_page(page_id)?.clone();
        let offset = page.append_record(&bytes)?;
        let free_space = page.free_space;
        self.cache.put_page(page_id, page, true)?;

        let meta = self.tables.get_mut(table).unwrap();
        meta.free_space.insert(page_id, free_space);

        Ok(RecordId { page_id, offset })
    }

    /// Reads every live record from `table` in ascending page-id order,
    /// applying `predicate` (if any) over the table's schema.
    pub fn scan(&mut self, table: &str, predicate: Option<&Expr>) -> DbResult<Vec<Row>> {
        let page_ids = self
            .tables
            .get(table)
            .ok_or_else(|| DbError::Semantic(format!("table '{table}' does not exist")))?
            .data_pages
            .clone();
        let schema = self.schema(table)?.clone();
        let column_names = schema.column_names();
        let ctx = EvalContext { schema: &column_names };

        let mut rows = Vec::new();
        for page_id in page_ids {
            let page = self.cache.get_page(page_id)?.clone();
            for (values, offset) in decode_live_records(&page, &schema)? {
                let row = Row::new(values).with_rid(RecordId { page_id, offset });
                let keep = match predicate {
                    Some(expr) => ctx.eval_predicate(expr, &row)?,
                    None => true,
                };
                if keep {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }

    /// Applies `assignments` (already coerced to each column's declared
    /// type) to every row matching `predicate`, relocating rows that no
    /// longer fit their page after growing.
    pub fn update(
        &mut self,
        table: &str,
        predicate: Option<&Expr>,
        assignments: &[(usize, Value)],
    ) -> DbResult<usize> {
        let page_ids = self
            .tables
            .get(table)
            .ok_or_else(|| DbError::Semantic(format!("table '{table}' does not exist")))?
            .data_pages
            .clone();
        let schema = self.schema(table)?.clone();
        let column_names = schema.column_names();
        let ctx = EvalContext { schema: &column_names };

        let mut updated = 0usize;
        let mut overflow: Vec<Vec<Value>> = Vec::new();

        for page_id in page_ids {
            let mut page = self.cache.get_page(page_id)?.clone();
            let live = decode_live_records(&page, &schema)?;
            let mut survivors: Vec<Vec<u8>> = Vec::with_capacity(live.len());
            let mut survivor_budget = 0usize;
            let mut changed = false;

            for (mut values, offset) in live {
                let row = Row::new(values.clone()).with_rid(RecordId { page_id, offset });
                let matches = match predicate {
                    Some(expr) => ctx.eval_predicate(expr, &row)?,
                    None => true,
                };
                if matches {
                    for (col, val) in assignments {
                        values[*col] = val.clone();
                    }
                    updated += 1;
                    changed = true;
                }

                let bytes = encode_record(&values, false, &schema)?;
                if survivor_budget + bytes.len() <= PAYLOAD_SIZE {
                    survivor_budget += bytes.len();
                    survivors.push(bytes);
                } else {
                    // Grew past what this page can still hold; relocate via
                    // a fresh insert instead (§9: detect overflow, tombstone
                    // and relocate rather than leaving the page inconsistent).
                    changed = true;
                    overflow.push(values);
                }
            }

            if changed {
                page.rewrite(&survivors)?;
                let free_space = page.free_space;
                self.cache.put_page(page_id, page, true)?;
                let meta = self.tables.get_mut(table).unwrap();
                meta.free_space.insert(page_id, free_space);
            }
        }

        for values in overflow {
            self.insert(table, values)?;
        }

        Ok(updated)
    }

    pub fn delete(&mut self, table: &str, predicate: Option<&Expr>) -> DbResult<usize> {
        let page_ids = self
            .tables
            .get(table)
            .ok_or_else(|| DbError::Semantic(format!("table '{table}' does not exist")))?
            .data_pages
            .clone();
        let schema = self.schema(table)?.clone();
        let column_names = schema.column_names();
        let ctx = EvalContext { schema: &column_names };

        let mut deleted = 0usize;
        for page_id in page_ids {
            let mut page = self.cache.get_page(page_id)?.clone();
            let live = decode_live_records(&page, &schema)?;
            let mut survivors: Vec<Vec<u8>> = Vec::with_capacity(live.len());
            let mut changed = false;

            for (values, offset) in live {
                let row = Row::new(values.clone()).with_rid(RecordId { page_id, offset });
                let matches = match predicate {
                    Some(expr) => ctx.eval_predicate(expr, &row)?,
                    None => true,
                };
                if matches {
                    deleted += 1;
                    changed = true;
                } else {
                    survivors.push(encode_record(&values, false, &schema)?);
                }
            }

            if changed {
                page.rewrite(&survivors)?;
                let free_space = page.free_space;
                self.cache.put_page(page_id, page, true)?;
                let meta = self.tables.get_mut(table).unwrap();
                meta.free_space.insert(page_id, free_space);
            }
        }
        Ok(deleted)
    }

    pub fn flush_all(&mut self) -> DbResult<()> {
        self.cache.flush_all()
    }
}

/// Decodes every non-tombstoned record on `page`, returning each record's
/// values and its header-relative byte offset.
fn decode_live_records(page: &Page, schema: &TableSchema) -> DbResult<Vec<(Vec<Value>, u32)>> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    for _ in 0..page.record_count {
        let (values, is_deleted, consumed) = decode_record(&page.payload, offset, schema)?;
        if !is_deleted {
            out.push((values, (HEADER_SIZE + offset) as u32));
        }
        offset += consumed;
    }
    Ok(out)
}
