use super::*;
use buffer::{BufferCache, TableStore};
use common::{DbError, EvictionPolicy};
use parser::parse_sql;
use storage::PageManager;
use tempfile::NamedTempFile;
use types::Value;

struct Fixture {
    catalog: Catalog,
    store: TableStore,
    indexes: IndexRegistry,
}

fn fixture() -> Fixture {
    let tmp = NamedTempFile::new().unwrap();
    std::fs::remove_file(tmp.path()).ok();
    let pm = PageManager::open(tmp.path()).unwrap();
    let cache = BufferCache::new(pm, 16, EvictionPolicy::Lru, 0.5);
    let mut store = TableStore::new(cache);
    let catalog = Catalog::bootstrap(&mut store).unwrap();
    Fixture { catalog, store, indexes: IndexRegistry::new() }
}

impl Fixture {
    fn run(&mut self, sql: &str) -> DbResult<ExecutionResult> {
        let stmt = parse_sql(sql).unwrap().remove(0);
        let plan = planner::plan(stmt, &self.catalog)?;
        execute(plan, &mut self.catalog, &mut self.store, &mut self.indexes)
    }
}

#[test]
fn create_table_then_insert_then_select_round_trips() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT, name VARCHAR, age INT);").unwrap();
    db.run("INSERT INTO students (id, name, age) VALUES (1, 'Ada', 30);").unwrap();
    db.run("INSERT INTO students (id, name, age) VALUES (2, 'Grace', 85);").unwrap();

    let result = db.run("SELECT * FROM students;").unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0]["name"], Value::Text("Ada".into()));
}

#[test]
fn select_with_where_filters_rows() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT, name VARCHAR, age INT);").unwrap();
    db.run("INSERT INTO students (id, name, age) VALUES (1, 'Ada', 30);").unwrap();
    db.run("INSERT INTO students (id, name, age) VALUES (2, 'Grace', 85);").unwrap();

    let result = db.run("SELECT name FROM students WHERE age > 40;").unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["name"], Value::Text("Grace".into()));
    assert!(!result.rows[0].contains_key("age"));
}

#[test]
fn group_by_produces_one_row_per_key() {
    let mut db = fixture();
    db.run("CREATE TABLE sales (dept VARCHAR, amount INT);").unwrap();
    db.run("INSERT INTO sales (dept, amount) VALUES ('A', 100);").unwrap();
    db.run("INSERT INTO sales (dept, amount) VALUES ('A', 200);").unwrap();
    db.run("INSERT INTO sales (dept, amount) VALUES ('B', 50);").unwrap();

    let result = db.run("SELECT dept, AVG(amount) AS avg_amt FROM sales GROUP BY dept;").unwrap();
    assert_eq!(result.rows.len(), 2);
    let a = result.rows.iter().find(|r| r["dept"] == Value::Text("A".into())).unwrap();
    assert_eq!(a["avg_amt"], Value::Int(150));
}

#[test]
fn aggregate_without_group_by_collapses_to_one_row() {
    let mut db = fixture();
    db.run("CREATE TABLE sales (dept VARCHAR, amount INT);").unwrap();
    db.run("INSERT INTO sales (dept, amount) VALUES ('A', 100);").unwrap();
    db.run("INSERT INTO sales (dept, amount) VALUES ('B', 200);").unwrap();

    let result = db.run("SELECT COUNT(*) AS n, SUM(amount) AS total FROM sales;").unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0]["n"], Value::Int(2));
    assert_eq!(result.rows[0]["total"], Value::Int(300));
}

#[test]
fn order_by_desc_with_limit() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT, age INT);").unwrap();
    db.run("INSERT INTO students (id, age) VALUES (1, 30);").unwrap();
    db.run("INSERT INTO students (id, age) VALUES (2, 85);").unwrap();
    db.run("INSERT INTO students (id, age) VALUES (3, 50);").unwrap();

    let result = db.run("SELECT id FROM students ORDER BY age DESC LIMIT 2;").unwrap();
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0]["id"], Value::Int(2));
    assert_eq!(result.rows[1]["id"], Value::Int(3));
}

#[test]
fn update_changes_matching_rows_only() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT, age INT);").unwrap();
    db.run("INSERT INTO students (id, age) VALUES (1, 30);").unwrap();
    db.run("INSERT INTO students (id, age) VALUES (2, 85);").unwrap();

    let result = db.run("UPDATE students SET age = 31 WHERE id = 1;").unwrap();
    assert_eq!(result.rows_affected, 1);

    let rows = db.run("SELECT age FROM students WHERE id = 1;").unwrap();
    assert_eq!(rows.rows[0]["age"], Value::Int(31));
}

#[test]
fn delete_removes_matching_rows() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT);").unwrap();
    db.run("INSERT INTO students (id) VALUES (1);").unwrap();
    db.run("INSERT INTO students (id) VALUES (2);").unwrap();

    let result = db.run("DELETE FROM students WHERE id = 1;").unwrap();
    assert_eq!(result.rows_affected, 1);
    assert_eq!(db.run("SELECT * FROM students;").unwrap().rows.len(), 1);
}

#[test]
fn unique_index_rejects_duplicate_insert() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT, name VARCHAR);").unwrap();
    db.run("CREATE UNIQUE INDEX idx_id ON students(id);").unwrap();
    db.run("INSERT INTO students (id, name) VALUES (1, 'Ada');").unwrap();

    let err = db.run("INSERT INTO students (id, name) VALUES (1, 'Eve');").unwrap_err();
    assert!(matches!(err, DbError::Constraint(_)));
    assert_eq!(db.run("SELECT * FROM students;").unwrap().rows.len(), 1);
}

#[test]
fn non_unique_index_allows_duplicate_keys() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT, name VARCHAR);").unwrap();
    db.run("CREATE INDEX idx_name ON students(name);").unwrap();
    db.run("INSERT INTO students (id, name) VALUES (1, 'Ada');").unwrap();
    db.run("INSERT INTO students (id, name) VALUES (2, 'Ada');").unwrap();

    assert_eq!(db.run("SELECT * FROM students;").unwrap().rows.len(), 2);
}

#[test]
fn drop_index_then_drop_again_errors() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT);").unwrap();
    db.run("CREATE INDEX idx_id ON students(id);").unwrap();
    db.run("DROP INDEX idx_id;").unwrap();

    let err = db.run("DROP INDEX idx_id;").unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}

#[test]
fn create_table_fails_on_duplicate_name() {
    let mut db = fixture();
    db.run("CREATE TABLE students (id INT);").unwrap();
    let err = db.run("CREATE TABLE students (id INT);").unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}
