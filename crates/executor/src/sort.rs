//! ORDER BY: stable sort over the working row set (§4.10).
//!
//! Kept as a standalone post-processing pass rather than a pulled operator,
//! since it has to see every row before it can emit the first one either
//! way — `TableStore::scan` already materializes the input, so there's
//! nothing left to stream.

use common::{DbResult, Row};
use parser::{OrderByItem, SortDirection};
use std::cmp::Ordering;
use types::Value;

pub fn apply(columns: &[String], mut rows: Vec<Row>, order_by: &[OrderByItem]) -> DbResult<Vec<Row>> {
    if order_by.is_empty() {
        return Ok(rows);
    }

    let positions: Vec<(usize, SortDirection)> = order_by
        .iter()
        .map(|item| {
            let idx = columns
                .iter()
                .position(|c| c == &item.column)
                .expect("planner already validated this ORDER BY column exists");
            (idx, item.direction)
        })
        .collect();

    rows.sort_by(|a, b| {
        for &(idx, direction) in &positions {
            let ord = compare_values(&a.values[idx], &b.values[idx]);
            let ord = match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    Ok(rows)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Int(_), Value::Text(_)) => Ordering::Less,
        (Value::Text(_), Value::Int(_)) => Ordering::Greater,
    }
}
