//! Query planner (§4.3). Walks the AST once, validating table/column names
//! against the catalog and coercing every WHERE/SET literal to the declared
//! type of the column it's compared against — once, here, rather than
//! re-guessing it on every row the executor visits.
//!
//! `SELECT` lowers to the fixed pipeline the executor expects: scan → filter
//! → (group-by or whole-input aggregate) → order by → limit → project.
//! There is no join or index-scan optimization to perform — this dialect has
//! neither multi-table FROM nor a planner-chosen access method, so `plan`
//! does name resolution and type coercion and stops there.

#[cfg(test)]
mod tests;

use catalog::{Catalog, IndexKind};
use common::{DbError, DbResult};
use expr::{BinaryOp, Expr};
use parser::{AggArg, AggFunc, ColumnDef, OrderByItem, SelectItem, Statement};
use storage::TableSchema;
use types::{SqlType, Value};

/// A single aggregate call resolved against a table's schema.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateSpec {
    pub func: AggFunc,
    pub arg: AggArg,
    pub label: String,
}

/// What the executor does to the filtered row stream before projecting it.
#[derive(Clone, Debug, PartialEq)]
pub enum Reduction {
    /// Rows pass through unchanged.
    None,
    /// The select list contains aggregates and no GROUP BY: the entire
    /// input collapses to a single row.
    Aggregate(Vec<AggregateSpec>),
    /// `GROUP BY keys`: one output row per distinct key tuple.
    GroupBy { keys: Vec<String>, aggregates: Vec<AggregateSpec> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhysicalPlan {
    CreateTable {
        name: String,
        columns: Vec<ColumnDef>,
    },
    CreateIndex {
        table: String,
        index_name: String,
        column: String,
        kind: IndexKind,
        unique: bool,
    },
    DropIndex {
        name: String,
    },
    /// Values are positional in schema-column order, already coerced.
    Insert {
        table: String,
        values: Vec<Value>,
    },
    /// Assignments are `(column ordinal, coerced value)` pairs.
    Update {
        table: String,
        assignments: Vec<(usize, Value)>,
        predicate: Option<Expr>,
    },
    Delete {
        table: String,
        predicate: Option<Expr>,
    },
    Select {
        table: String,
        predicate: Option<Expr>,
        reduction: Reduction,
        order_by: Vec<OrderByItem>,
        limit: Option<u64>,
        projection: Vec<SelectItem>,
    },
}

/// Converts a parsed statement into an executor-ready plan.
pub fn plan(stmt: Statement, catalog: &Catalog) -> DbResult<PhysicalPlan> {
    match stmt {
        Statement::CreateTable { name, columns } => {
            if catalog.table_exists(&name) {
                return Err(DbError::Semantic(format!("table '{name}' already exists")));
            }
            Ok(PhysicalPlan::CreateTable { name, columns })
        }
        Statement::CreateIndex { name, table, column, unique } => {
            let meta = catalog.table(&table)?;
            if meta.schema.position(&column).is_none() {
                return Err(DbError::Semantic(format!(
                    "column '{column}' does not exist on table '{table}'"
                )));
            }
            if catalog.index_on_column(&table, &column).is_some() {
                return Err(DbError::Semantic(format!(
                    "column '{column}' on table '{table}' is already indexed"
                )));
            }
            Ok(PhysicalPlan::CreateIndex {
                table,
                index_name: name,
                column,
                kind: IndexKind::BTree,
                unique,
            })
        }
        Statement::DropIndex { name } => Ok(PhysicalPlan::DropIndex { name }),
        Statement::Insert { table, columns, values } => {
            let meta = catalog.table(&table)?;
            plan_insert(&table, columns, values, &meta.schema)
        }
        Statement::Update { table, assignments, selection } => {
            let meta = catalog.table(&table)?;
            let schema = &meta.schema;

            let resolved_assignments = assignments
                .into_iter()
                .map(|(name, expr)| {
                    let idx = schema.position(&name).ok_or_else(|| {
                        DbError::Semantic(format!(
                            "column '{name}' does not exist on table '{table}'"
                        ))
                    })?;
                    let ty = schema.columns[idx].data_type;
                    let value = coerce_literal(expr, ty)?;
                    Ok((idx, value))
                })
                .collect::<DbResult<Vec<_>>>()?;

            let predicate = selection.map(|e| coerce_predicate(e, schema)).transpose()?;

            Ok(PhysicalPlan::Update { table, assignments: resolved_assignments, predicate })
        }
        Statement::Delete { table, selection } => {
            let meta = catalog.table(&table)?;
            let predicate = selection.map(|e| coerce_predicate(e, &meta.schema)).transpose()?;
            Ok(PhysicalPlan::Delete { table, predicate })
        }
        Statement::Select { items, table, selection, group_by, order_by, limit } => {
            let meta = catalog.table(&table)?;
            let schema = &meta.schema;

            for item in &items {
                validate_select_item(item, schema)?;
            }
            for key in &group_by {
                if schema.position(key).is_none() {
                    return Err(DbError::Semantic(format!(
                        "unknown GROUP BY column '{key}'"
                    )));
                }
            }
            for item in &order_by {
                if schema.position(&item.column).is_none() && !has_matching_alias(&items, &item.column)
                {
                    return Err(DbError::Semantic(format!(
                        "unknown ORDER BY column '{}'",
                        item.column
                    )));
                }
            }

            let predicate = selection.map(|e| coerce_predicate(e, schema)).transpose()?;
            let aggregates = collect_aggregates(&items);

            let reduction = if !group_by.is_empty() {
                Reduction::GroupBy { keys: group_by, aggregates }
            } else if !aggregates.is_empty() {
                Reduction::Aggregate(aggregates)
            } else {
                Reduction::None
            };

            Ok(PhysicalPlan::Select {
                table,
                predicate,
                reduction,
                order_by,
                limit,
                projection: items,
            })
        }
    }
}

fn has_matching_alias(items: &[SelectItem], name: &str) -> bool {
    items.iter().any(|item| item.default_label() == name)
}

fn validate_select_item(item: &SelectItem, schema: &TableSchema) -> DbResult<()> {
    match item {
        SelectItem::Wildcard => Ok(()),
        SelectItem::Column(name) => {
            if schema.position(name).is_none() {
                return Err(DbError::Semantic(format!("unknown column '{name}'")));
            }
            Ok(())
        }
        SelectItem::Aggregate { arg: AggArg::Column(name), .. } => {
            if schema.position(name).is_none() {
                return Err(DbError::Semantic(format!("unknown column '{name}'")));
            }
            Ok(())
        }
        SelectItem::Aggregate { arg: AggArg::Star, .. } => Ok(()),
    }
}

fn collect_aggregates(items: &[SelectItem]) -> Vec<AggregateSpec> {
    items
        .iter()
        .filter_map(|item| match item {
            SelectItem::Aggregate { func, arg, alias } => Some(AggregateSpec {
                func: *func,
                arg: arg.clone(),
                label: alias.clone().unwrap_or_else(|| item.default_label()),
            }),
            _ => None,
        })
        .collect()
}

fn plan_insert(
    table: &str,
    columns: Vec<String>,
    values: Vec<Expr>,
    schema: &TableSchema,
) -> DbResult<PhysicalPlan> {
    if columns.len() != schema.columns.len() {
        return Err(DbError::Semantic(format!(
            "INSERT into '{table}' must name all {} columns, got {}",
            schema.columns.len(),
            columns.len()
        )));
    }

    let mut seen = std::collections::HashSet::new();
    for name in &columns {
        if !seen.insert(name.as_str()) {
            return Err(DbError::Semantic(format!("duplicate column '{name}' in INSERT")));
        }
        if schema.position(name).is_none() {
            return Err(DbError::Semantic(format!(
                "column '{name}' does not exist on table '{table}'"
            )));
        }
    }

    let mut ordered: Vec<Option<Value>> = vec![None; schema.columns.len()];
    for (name, expr) in columns.into_iter().zip(values) {
        let idx = schema.position(&name).unwrap();
        let ty = schema.columns[idx].data_type;
        ordered[idx] = Some(coerce_literal(expr, ty)?);
    }

    let values = ordered
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                DbError::Semantic(format!(
                    "missing value for column '{}'",
                    schema.columns[i].name
                ))
            })
        })
        .collect::<DbResult<Vec<_>>>()?;

    Ok(PhysicalPlan::Insert { table: table.to_string(), values })
}

fn coerce_literal(expr: Expr, ty: SqlType) -> DbResult<Value> {
    match expr {
        Expr::Literal(value) => value
            .coerce_to(ty)
            .ok_or_else(|| DbError::Semantic(format!("value {value:?} is not a valid {ty}"))),
        other => Err(DbError::Semantic(format!("expected a literal value, got {other:?}"))),
    }
}

/// Walks a WHERE/SET condition tree, coercing each literal that appears
/// opposite a column reference to that column's declared type.
fn coerce_predicate(expr: Expr, schema: &TableSchema) -> DbResult<Expr> {
    match expr {
        Expr::Binary { left, op, right } if op.is_logical() => Ok(Expr::Binary {
            left: Box::new(coerce_predicate(*left, schema)?),
            op,
            right: Box::new(coerce_predicate(*right, schema)?),
        }),
        Expr::Binary { left, op, right } => coerce_comparison(*left, op, *right, schema),
        Expr::Unary { op, expr } => {
            Ok(Expr::Unary { op, expr: Box::new(coerce_predicate(*expr, schema)?) })
        }
        other => Ok(other),
    }
}

fn coerce_comparison(left: Expr, op: BinaryOp, right: Expr, schema: &TableSchema) -> DbResult<Expr> {
    let column_type = match (&left, &right) {
        (Expr::Column { name, .. }, _) | (_, Expr::Column { name, .. }) => schema
            .type_of(name)
            .ok_or_else(|| DbError::Semantic(format!("unknown column '{name}'")))?,
        _ => {
            return Ok(Expr::Binary { left: Box::new(left), op, right: Box::new(right) });
        }
    };

    let coerce_side = |side: Expr| -> DbResult<Expr> {
        match side {
            Expr::Literal(value) => {
                let coerced = value.coerce_to(column_type).ok_or_else(|| {
                    DbError::Semantic(format!("value {value:?} is not a valid {column_type}"))
                })?;
                Ok(Expr::Literal(coerced))
            }
            other => Ok(other),
        }
    };

    Ok(Expr::Binary { left: Box::new(coerce_side(left)?), op, right: Box::new(coerce_side(right)?) })
}
