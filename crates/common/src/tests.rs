use super::*;
use std::io;

#[test]
fn config_defaults_are_sane() {
    let cfg = Config::default();
    assert_eq!(cfg.buffer_pool_pages, 256);
    assert_eq!(cfg.eviction_policy, EvictionPolicy::Lru);
}

#[test]
fn config_builder_overrides_defaults() {
    let cfg = Config::builder().buffer_pool_pages(8).build();
    assert_eq!(cfg.buffer_pool_pages, 8);
    assert_eq!(cfg.path, PathBuf::from("./database.heap"));
}

#[test]
fn db_error_formats_cleanly() {
    let err = DbError::Storage("corruption".into());
    assert!(format!("{err}").contains("storage"));
}

#[test]
fn parse_error_carries_position() {
    let err = DbError::Parse {
        message: "unexpected token".into(),
        line: 2,
        column: 5,
        expected: "FROM".into(),
    };
    let rendered = format!("{err}");
    assert!(rendered.contains("line 2"));
    assert!(rendered.contains("column 5"));
}

#[test]
fn recordbatch_consistency() {
    let rb = RecordBatch {
        columns: vec!["id".into()],
        rows: vec![Row::new(vec![Value::Int(1)])],
    };
    assert_eq!(rb.columns.len(), 1);
    assert_eq!(rb.rows[0].values.len(), 1);
}

#[test]
fn io_error_converts() {
    let e = io::Error::other("oops");
    let db_err: DbError = e.into();
    assert!(matches!(db_err, DbError::Io(_)));
}

#[test]
fn execution_stats_total_time_sums_phases() {
    let stats = ExecutionStats {
        open_time: Duration::from_millis(5),
        total_next_time: Duration::from_millis(150),
        close_time: Duration::from_millis(2),
        rows_produced: 1000,
        rows_filtered: 500,
        pages_scanned: 10,
    };
    assert_eq!(stats.total_time().as_millis(), 157);
}
