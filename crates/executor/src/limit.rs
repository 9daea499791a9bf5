//! LIMIT: truncates the working row set to the first N rows (§4.10).

use common::Row;

pub fn apply(rows: Vec<Row>, limit: Option<u64>) -> Vec<Row> {
    match limit {
        Some(n) => rows.into_iter().take(n as usize).collect(),
        None => rows,
    }
}
