//! End-to-end scenarios driven entirely through `Database::execute_sql`,
//! exercising the lexer-to-storage pipeline as a caller would see it.

use common::{Config, EvictionPolicy};
use database::Database;
use types::Value;

fn open(path: &std::path::Path) -> Database {
    let config = Config::builder()
        .path(path.to_path_buf())
        .buffer_pool_pages(16)
        .eviction_policy(EvictionPolicy::Lru)
        .build();
    Database::open(&config).unwrap()
}

fn fresh_path() -> tempfile::TempPath {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let path = tmp.into_temp_path();
    std::fs::remove_file(&path).ok();
    path
}

#[test]
fn create_insert_select_round_trip() {
    let path = fresh_path();
    let mut db = open(&path);

    db.execute_sql("CREATE TABLE t(id INT, name VARCHAR);");
    db.execute_sql("INSERT INTO t(id,name) VALUES (1,'Alice');");
    db.execute_sql("INSERT INTO t(id,name) VALUES (2,'Bob');");
    let result = db.execute_sql("SELECT * FROM t;");

    assert!(result.success);
    assert_eq!(result.rows_affected, 0);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0]["id"], Value::Int(1));
    assert_eq!(result.rows[0]["name"], Value::Text("Alice".into()));
    assert_eq!(result.rows[1]["id"], Value::Int(2));
}

#[test]
fn predicate_with_string_int_coercion() {
    let path = fresh_path();
    let mut db = open(&path);
    db.execute_sql("CREATE TABLE t(id INT, name VARCHAR);");
    db.execute_sql("INSERT INTO t(id,name) VALUES (1,'Alice');");
    db.execute_sql("INSERT INTO t(id,name) VALUES (2,'Bob');");

    let result = db.execute_sql("SELECT name FROM t WHERE id > 1;");
    assert!(result.success);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["name"], Value::Text("Bob".into()));
}

#[test]
fn delete_then_select_reflects_removal() {
    let path = fresh_path();
    let mut db = open(&path);
    db.execute_sql("CREATE TABLE t(id INT, name VARCHAR);");
    db.execute_sql("INSERT INTO t(id,name) VALUES (1,'Alice');");
    db.execute_sql("INSERT INTO t(id,name) VALUES (2,'Bob');");

    let deleted = db.execute_sql("DELETE FROM t WHERE id = 1;");
    assert!(deleted.success);
    assert_eq!(deleted.rows_affected, 1);

    let remaining = db.execute_sql("SELECT * FROM t;");
    assert_eq!(remaining.rows.len(), 1);
    assert_eq!(remaining.rows[0]["id"], Value::Int(2));
}

#[test]
fn aggregate_with_group_by() {
    let path = fresh_path();
    let mut db = open(&path);
    db.execute_sql("CREATE TABLE e(id INT, dept VARCHAR, sal INT);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (1,'A',100);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (2,'A',200);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (3,'B',300);");

    let result = db.execute_sql("SELECT dept, COUNT(*) AS n, AVG(sal) AS avg_sal FROM e GROUP BY dept;");
    assert!(result.success);
    assert_eq!(result.rows.len(), 2);

    let a = result.rows.iter().find(|r| r["dept"] == Value::Text("A".into())).unwrap();
    assert_eq!(a["n"], Value::Int(2));
    assert_eq!(a["avg_sal"], Value::Int(150));

    let b = result.rows.iter().find(|r| r["dept"] == Value::Text("B".into())).unwrap();
    assert_eq!(b["n"], Value::Int(1));
    assert_eq!(b["avg_sal"], Value::Int(300));
}

#[test]
fn persistence_across_reopen() {
    let path = fresh_path();
    {
        let mut db = open(&path);
        db.execute_sql("CREATE TABLE t(id INT, name VARCHAR);");
        db.execute_sql("INSERT INTO t(id,name) VALUES (1,'Alice');");
        db.execute_sql("INSERT INTO t(id,name) VALUES (2,'Bob');");
    }

    let mut db = open(&path);
    let result = db.execute_sql("SELECT COUNT(*) AS n FROM t;");
    assert!(result.success, "{}", result.message);
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["n"], Value::Int(2));
}

#[test]
fn order_by_with_limit() {
    let path = fresh_path();
    let mut db = open(&path);
    db.execute_sql("CREATE TABLE e(id INT, dept VARCHAR, sal INT);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (1,'A',100);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (2,'A',200);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (3,'B',300);");

    let result = db.execute_sql("SELECT id, sal FROM e ORDER BY sal DESC LIMIT 2;");
    assert!(result.success);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0]["id"], Value::Int(3));
    assert_eq!(result.rows[0]["sal"], Value::Int(300));
    assert_eq!(result.rows[1]["id"], Value::Int(2));
    assert_eq!(result.rows[1]["sal"], Value::Int(200));
}

#[test]
fn index_maintenance_point_search_finds_row_location() {
    let path = fresh_path();
    let mut db = open(&path);
    db.execute_sql("CREATE TABLE e(id INT, dept VARCHAR, sal INT);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (1,'A',100);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (2,'A',200);");
    db.execute_sql("INSERT INTO e(id,dept,sal) VALUES (3,'B',300);");
    db.execute_sql("CREATE INDEX idx_sal ON e(sal);");

    let matches = db.index_lookup("e", "sal", &Value::Int(200)).unwrap();
    assert_eq!(matches.len(), 1);

    let rows = db.execute_sql("SELECT * FROM e;");
    let expected_id = rows
        .rows
        .iter()
        .find(|r| r["sal"] == Value::Int(200))
        .unwrap()["id"]
        .clone();
    assert_eq!(expected_id, Value::Int(2));
}

#[test]
fn multiple_statements_in_one_call_execute_in_order_and_return_the_last_result() {
    let path = fresh_path();
    let mut db = open(&path);

    let result = db.execute_sql(
        "CREATE TABLE t(id INT, name VARCHAR); \
         INSERT INTO t(id,name) VALUES (1,'Alice'); \
         INSERT INTO t(id,name) VALUES (2,'Bob'); \
         SELECT * FROM t;",
    );

    assert!(result.success, "{}", result.message);
    assert_eq!(result.rows.len(), 2, "result should reflect only the final SELECT");
    assert_eq!(result.rows[0]["id"], Value::Int(1));
    assert_eq!(result.rows[1]["id"], Value::Int(2));

    // Both inserts from the same call actually landed, not just the last one.
    let recount = db.execute_sql("SELECT COUNT(*) AS n FROM t;");
    assert_eq!(recount.rows[0]["n"], Value::Int(2));
}

#[test]
fn malformed_sql_reports_failure_without_panicking() {
    let path = fresh_path();
    let mut db = open(&path);
    let result = db.execute_sql("SELEKT * FROM nowhere;");
    assert!(!result.success);
    assert!(!result.message.is_empty());
}

#[test]
fn unknown_table_is_a_semantic_error() {
    let path = fresh_path();
    let mut db = open(&path);
    let result = db.execute_sql("SELECT * FROM ghost;");
    assert!(!result.success);
}
