//! Query executor (§4.10). Interprets a `planner::PhysicalPlan` against a
//! `Catalog` and `TableStore`, maintaining whatever B+Tree/hash indexes are
//! registered for the statement's table as it goes.
//!
//! Unlike the teacher's pull-based Volcano tree, there is no join and no
//! planner-chosen access method left to pull lazily: `TableStore::scan`
//! already walks pages and applies the WHERE predicate in one call, so a
//! `Select` plan is interpreted as a short, fixed pipeline over a
//! materialized `Vec<Row>` — scan → reduce → order by → limit → project —
//! rather than a tree of operators pulling from one another.

mod ddl;
mod dml;
mod indexes;
mod limit;
mod project;
mod reduce;
mod sort;
#[cfg(test)]
mod tests;

pub use indexes::{IndexHandle, IndexRegistry};

use catalog::Catalog;
use common::{DbResult, RowMap};
use planner::PhysicalPlan;

/// Outcome of executing one statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionResult {
    pub message: String,
    pub columns: Vec<String>,
    pub rows: Vec<RowMap>,
    pub rows_affected: u64,
}

impl ExecutionResult {
    fn ddl(message: impl Into<String>) -> Self {
        Self { message: message.into(), columns: Vec::new(), rows: Vec::new(), rows_affected: 0 }
    }

    fn dml(message: impl Into<String>, rows_affected: u64) -> Self {
        Self { message: message.into(), columns: Vec::new(), rows: Vec::new(), rows_affected }
    }

    fn query(columns: Vec<String>, rows: Vec<RowMap>) -> Self {
        let rows_affected = rows.len() as u64;
        Self { message: format!("{rows_affected} row(s)"), columns, rows, rows_affected }
    }
}

/// Runs one physical plan to completion, applying every side effect
/// (row mutation, index maintenance, flush) before returning.
pub fn execute(
    plan: PhysicalPlan,
    catalog: &mut Catalog,
    store: &mut buffer::TableStore,
    indexes: &mut IndexRegistry,
) -> DbResult<ExecutionResult> {
    let result = match plan {
        PhysicalPlan::CreateTable { name, columns } => ddl::create_table(catalog, store, name, columns),
        PhysicalPlan::CreateIndex { table, index_name, column, kind, unique } => {
            ddl::create_index(catalog, store, indexes, table, index_name, column, kind, unique)
        }
        PhysicalPlan::DropIndex { name } => ddl::drop_index(catalog, store, indexes, name),
        PhysicalPlan::Insert { table, values } => dml::insert(catalog, store, indexes, table, values),
        PhysicalPlan::Update { table, assignments, predicate } => {
            dml::update(catalog, store, indexes, table, assignments, predicate)
        }
        PhysicalPlan::Delete { table, predicate } => dml::delete(catalog, store, indexes, table, predicate),
        PhysicalPlan::Select { table, predicate, reduction, order_by, limit, projection } => {
            select(catalog, store, table, predicate, reduction, order_by, limit, projection)
        }
    }?;
    store.flush_all()?;
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn select(
    catalog: &Catalog,
    store: &mut buffer::TableStore,
    table: String,
    predicate: Option<expr::Expr>,
    reduction: planner::Reduction,
    order_by: Vec<parser::OrderByItem>,
    limit: Option<u64>,
    projection: Vec<parser::SelectItem>,
) -> DbResult<ExecutionResult> {
    let meta = catalog.table(&table)?;
    let source_columns = meta.schema.column_names();

    let rows = store.scan(&table, predicate.as_ref())?;
    let (columns, rows) = reduce::apply(&source_columns, rows, reduction)?;
    let rows = sort::apply(&columns, rows, &order_by)?;
    let rows = limit::apply(rows, limit);
    let (out_columns, out_rows) = project::apply(&columns, rows, &projection)?;

    Ok(ExecutionResult::query(out_columns, out_rows))
}
