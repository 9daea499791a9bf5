//! Final projection: narrows the working row set to the select list (§4.10).
//!
//! Runs after reduction, so `columns` already reflects whatever the row
//! carries at this point — the table's own schema for a plain SELECT, or
//! group keys plus aggregate labels for GROUP BY/whole-input aggregation.
//! `*` passes the working row through unchanged; named items and aggregate
//! references are looked up by label.

use common::{DbResult, Row, RowMap};
use parser::{AggArg, SelectItem};
use types::Value;

pub fn apply(
    columns: &[String],
    rows: Vec<Row>,
    projection: &[SelectItem],
) -> DbResult<(Vec<String>, Vec<RowMap>)> {
    let out_columns: Vec<String> = projection
        .iter()
        .flat_map(|item| match item {
            SelectItem::Wildcard => columns.to_vec(),
            other => vec![other.default_label()],
        })
        .collect();

    let out_rows = rows
        .into_iter()
        .map(|row| {
            let mut map = RowMap::new();
            for item in projection {
                match item {
                    SelectItem::Wildcard => {
                        for (name, value) in columns.iter().zip(&row.values) {
                            map.insert(name.clone(), value.clone());
                        }
                    }
                    SelectItem::Column(name) => {
                        map.insert(name.clone(), lookup(columns, &row.values, name));
                    }
                    SelectItem::Aggregate { arg: AggArg::Column(name), alias, .. } => {
                        let label = alias.clone().unwrap_or_else(|| item.default_label());
                        map.insert(label.clone(), lookup(columns, &row.values, &label));
                    }
                    SelectItem::Aggregate { arg: AggArg::Star, .. } => {
                        let label = item.default_label();
                        map.insert(label.clone(), lookup(columns, &row.values, &label));
                    }
                }
            }
            map
        })
        .collect();

    Ok((out_columns, out_rows))
}

fn lookup(columns: &[String], values: &[Value], name: &str) -> Value {
    columns
        .iter()
        .position(|c| c == name)
        .map(|idx| values[idx].clone())
        .unwrap_or(Value::Null)
}
