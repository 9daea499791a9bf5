//! Applies a planner::Reduction to the filtered row stream (§4.10).
//!
//! `None` passes rows through under the table's own schema. `Aggregate`
//! collapses every row to one. `GroupBy` partitions by key tuple first,
//! preserving first-seen group order, then reduces each partition the same
//! way. There's no floating-point type in this dialect (`types::Value` is
//! Int/Text/Null only), so AVG truncates like integer division.

use common::{DbResult, Row};
use parser::{AggArg, AggFunc};
use planner::{AggregateSpec, Reduction};
use types::Value;

pub fn apply(
    source_columns: &[String],
    rows: Vec<Row>,
    reduction: Reduction,
) -> DbResult<(Vec<String>, Vec<Row>)> {
    match reduction {
        Reduction::None => Ok((source_columns.to_vec(), rows)),
        Reduction::Aggregate(specs) => {
            let values = specs.iter().map(|spec| eval(spec, source_columns, &rows)).collect();
            let columns = specs.into_iter().map(|s| s.label).collect();
            Ok((columns, vec![Row::new(values)]))
        }
        Reduction::GroupBy { keys, aggregates } => {
            let key_positions: Vec<usize> =
                keys.iter().map(|k| position(source_columns, k)).collect();

            let mut order: Vec<Vec<Value>> = Vec::new();
            let mut groups: std::collections::HashMap<Vec<Value>, Vec<Row>> =
                std::collections::HashMap::new();
            for row in rows {
                let key: Vec<Value> = key_positions.iter().map(|&p| row.values[p].clone()).collect();
                if !groups.contains_key(&key) {
                    order.push(key.clone());
                }
                groups.entry(key).or_default().push(row);
            }

            let mut out_rows = Vec::with_capacity(order.len());
            for key in &order {
                let members = &groups[key];
                let mut values = key.clone();
                for spec in &aggregates {
                    values.push(eval(spec, source_columns, members));
                }
                out_rows.push(Row::new(values));
            }

            let mut columns = keys;
            columns.extend(aggregates.into_iter().map(|s| s.label));
            Ok((columns, out_rows))
        }
    }
}

fn position(columns: &[String], name: &str) -> usize {
    columns
        .iter()
        .position(|c| c == name)
        .expect("planner already validated this column exists")
}

fn eval(spec: &AggregateSpec, columns: &[String], rows: &[Row]) -> Value {
    match spec.func {
        AggFunc::Count => match &spec.arg {
            AggArg::Star => Value::Int(rows.len() as i32),
            AggArg::Column(name) => {
                let idx = position(columns, name);
                Value::Int(rows.iter().filter(|r| !r.values[idx].is_null()).count() as i32)
            }
        },
        AggFunc::Sum => Value::Int(numeric_values(spec, columns, rows).iter().sum()),
        AggFunc::Avg => {
            let values = numeric_values(spec, columns, rows);
            if values.is_empty() {
                Value::Int(0)
            } else {
                Value::Int(values.iter().sum::<i32>() / values.len() as i32)
            }
        }
        AggFunc::Max => Value::Int(numeric_values(spec, columns, rows).into_iter().max().unwrap_or(0)),
        AggFunc::Min => Value::Int(numeric_values(spec, columns, rows).into_iter().min().unwrap_or(0)),
    }
}

fn numeric_values(spec: &AggregateSpec, columns: &[String], rows: &[Row]) -> Vec<i32> {
    let AggArg::Column(name) = &spec.arg else {
        return rows.iter().map(|_| 1).collect();
    };
    let idx = position(columns, name);
    rows.iter().filter_map(|r| r.values[idx].as_int()).collect()
}
