//! Schema operators: CREATE TABLE, CREATE INDEX, DROP INDEX.

use buffer::TableStore;
use catalog::{Catalog, IndexKind};
use common::DbResult;
use storage::ColumnInfo;

use crate::{ExecutionResult, IndexRegistry};

pub fn create_table(
    catalog: &mut Catalog,
    store: &mut TableStore,
    name: String,
    columns: Vec<parser::ColumnDef>,
) -> DbResult<ExecutionResult> {
    let columns = columns.into_iter().map(|c| ColumnInfo::new(&c.name, c.ty)).collect();
    catalog.create_table(store, &name, columns)?;
    Ok(ExecutionResult::ddl(format!("table '{name}' created")))
}

#[allow(clippy::too_many_arguments)]
pub fn create_index(
    catalog: &mut Catalog,
    store: &mut TableStore,
    indexes: &mut IndexRegistry,
    table: String,
    index_name: String,
    column: String,
    kind: IndexKind,
    unique: bool,
) -> DbResult<ExecutionResult> {
    catalog.create_index(store, &table, &index_name, &column, kind.clone(), unique)?;
    indexes.rebuild(store, &table, &column, &kind)?;
    Ok(ExecutionResult::ddl(format!("index '{index_name}' created on {table}({column})")))
}

pub fn drop_index(
    catalog: &mut Catalog,
    store: &mut TableStore,
    indexes: &mut IndexRegistry,
    name: String,
) -> DbResult<ExecutionResult> {
    let meta = catalog
        .index_by_name(&name)
        .ok_or_else(|| common::DbError::Semantic(format!("index '{name}' does not exist")))?;
    let (table, column) = (meta.table.clone(), meta.column.clone());

    catalog.drop_index(store, &table, &name)?;
    indexes.drop_index(&table, &column);
    Ok(ExecutionResult::ddl(format!("index '{name}' dropped")))
}
