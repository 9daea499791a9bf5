//! Row-mutating operators: INSERT, UPDATE, DELETE.
//!
//! INSERT maintains indexes incrementally, since `TableStore::insert`
//! returns the exact `RecordId` of the row it just wrote. UPDATE and DELETE
//! don't get that back — `TableStore` only reports how many rows matched,
//! not which ones moved — so any index on the touched table is rebuilt from
//! a fresh scan afterward rather than patched in place.

use buffer::TableStore;
use catalog::Catalog;
use common::{DbError, DbResult};
use expr::Expr;
use types::Value;

use crate::{ExecutionResult, IndexRegistry};

pub fn insert(
    catalog: &Catalog,
    store: &mut TableStore,
    indexes: &mut IndexRegistry,
    table: String,
    values: Vec<Value>,
) -> DbResult<ExecutionResult> {
    for index in catalog.indexes_on(&table) {
        if index.unique {
            if let Some(handle) = indexes.get(&table, &index.column) {
                let position = catalog.table(&table)?.schema.position(&index.column).unwrap();
                if !handle.search(&values[position])?.is_empty() {
                    return Err(DbError::Constraint(format!(
                        "duplicate value for unique column '{}'",
                        index.column
                    )));
                }
            }
        }
    }

    let rid = store.insert(&table, values.clone())?;

    for index in catalog.indexes_on(&table) {
        let position = catalog.table(&table)?.schema.position(&index.column).unwrap();
        let value = values[position].clone();
        if value.is_null() {
            continue;
        }
        if let Some(handle) = indexes.get_mut(&table, &index.column) {
            handle.insert(value, rid)?;
        }
    }

    Ok(ExecutionResult::dml("1 row inserted", 1))
}

pub fn update(
    catalog: &Catalog,
    store: &mut TableStore,
    indexes: &mut IndexRegistry,
    table: String,
    assignments: Vec<(usize, Value)>,
    predicate: Option<Expr>,
) -> DbResult<ExecutionResult> {
    let affected = store.update(&table, predicate.as_ref(), &assignments)?;
    rebuild_indexes(catalog, store, indexes, &table)?;
    Ok(ExecutionResult::dml(format!("{affected} row(s) updated"), affected as u64))
}

pub fn delete(
    catalog: &Catalog,
    store: &mut TableStore,
    indexes: &mut IndexRegistry,
    table: String,
    predicate: Option<Expr>,
) -> DbResult<ExecutionResult> {
    let affected = store.delete(&table, predicate.as_ref())?;
    rebuild_indexes(catalog, store, indexes, &table)?;
    Ok(ExecutionResult::dml(format!("{affected} row(s) deleted"), affected as u64))
}

fn rebuild_indexes(
    catalog: &Catalog,
    store: &mut TableStore,
    indexes: &mut IndexRegistry,
    table: &str,
) -> DbResult<()> {
    for index in catalog.indexes_on(table) {
        indexes.rebuild(store, table, &index.column, &index.kind)?;
    }
    Ok(())
}
