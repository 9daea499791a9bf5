use super::*;
use buffer::{BufferCache, TableStore};
use common::EvictionPolicy;
use parser::parse_sql;
use storage::PageManager;
use tempfile::NamedTempFile;
use types::SqlType;

fn store() -> TableStore {
    let tmp = NamedTempFile::new().unwrap();
    std::fs::remove_file(tmp.path()).ok();
    let pm = PageManager::open(tmp.path()).unwrap();
    let cache = BufferCache::new(pm, 16, EvictionPolicy::Lru, 0.5);
    TableStore::new(cache)
}

fn sample_catalog() -> (Catalog, TableStore) {
    let mut store = store();
    let mut catalog = Catalog::bootstrap(&mut store).unwrap();
    catalog
        .create_table(
            &mut store,
            "students",
            vec![
                storage::ColumnInfo::new("id", SqlType::Int),
                storage::ColumnInfo::new("name", SqlType::Varchar),
                storage::ColumnInfo::new("age", SqlType::Int),
            ],
        )
        .unwrap();
    (catalog, store)
}

#[test]
fn create_table_fails_if_already_exists() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("CREATE TABLE students (id INT);").unwrap().remove(0);
    let err = plan(stmt, &catalog).unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}

#[test]
fn insert_requires_every_column_named() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("INSERT INTO students (id, name) VALUES (1, 'Ada');").unwrap().remove(0);
    let err = plan(stmt, &catalog).unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}

#[test]
fn insert_coerces_and_orders_values_by_schema() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("INSERT INTO students (name, id, age) VALUES ('Ada', 1, 30);")
        .unwrap()
        .remove(0);
    let plan = plan(stmt, &catalog).unwrap();
    match plan {
        PhysicalPlan::Insert { table, values } => {
            assert_eq!(table, "students");
            assert_eq!(values, vec![Value::Int(1), Value::Text("Ada".into()), Value::Int(30)]);
        }
        other => panic!("expected Insert, got {other:?}"),
    }
}

#[test]
fn select_where_coerces_literal_against_column_type() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("SELECT name FROM students WHERE id > 1;").unwrap().remove(0);
    let plan = plan(stmt, &catalog).unwrap();
    match plan {
        PhysicalPlan::Select { predicate: Some(Expr::Binary { right, .. }), .. } => {
            assert_eq!(*right, Expr::Literal(Value::Int(1)));
        }
        other => panic!("expected Select with coerced predicate, got {other:?}"),
    }
}

#[test]
fn select_rejects_unknown_column() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("SELECT bogus FROM students;").unwrap().remove(0);
    let err = plan(stmt, &catalog).unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}

#[test]
fn select_with_group_by_produces_groupby_reduction() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("SELECT name, COUNT(*) FROM students GROUP BY name;")
        .unwrap()
        .remove(0);
    let plan = plan(stmt, &catalog).unwrap();
    match plan {
        PhysicalPlan::Select { reduction: Reduction::GroupBy { keys, aggregates }, .. } => {
            assert_eq!(keys, vec!["name".to_string()]);
            assert_eq!(aggregates.len(), 1);
            assert_eq!(aggregates[0].func, AggFunc::Count);
        }
        other => panic!("expected GroupBy reduction, got {other:?}"),
    }
}

#[test]
fn select_with_aggregate_and_no_group_by_produces_aggregate_reduction() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("SELECT AVG(age) FROM students;").unwrap().remove(0);
    let plan = plan(stmt, &catalog).unwrap();
    match plan {
        PhysicalPlan::Select { reduction: Reduction::Aggregate(specs), .. } => {
            assert_eq!(specs.len(), 1);
            assert_eq!(specs[0].label, "AVG(age)");
        }
        other => panic!("expected Aggregate reduction, got {other:?}"),
    }
}

#[test]
fn select_with_plain_columns_has_no_reduction() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("SELECT * FROM students;").unwrap().remove(0);
    let plan = plan(stmt, &catalog).unwrap();
    assert!(matches!(plan, PhysicalPlan::Select { reduction: Reduction::None, .. }));
}

#[test]
fn update_resolves_column_ordinal_and_coerces_value() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("UPDATE students SET age = 31 WHERE id = 1;").unwrap().remove(0);
    let plan = plan(stmt, &catalog).unwrap();
    match plan {
        PhysicalPlan::Update { assignments, .. } => {
            assert_eq!(assignments, vec![(2, Value::Int(31))]);
        }
        other => panic!("expected Update, got {other:?}"),
    }
}

#[test]
fn create_index_rejects_unknown_column() {
    let (catalog, _store) = sample_catalog();
    let stmt = parse_sql("CREATE INDEX idx ON students(bogus);").unwrap().remove(0);
    let err = plan(stmt, &catalog).unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}

#[test]
fn create_index_rejects_already_indexed_column() {
    let (mut catalog, mut store) = sample_catalog();
    catalog
        .create_index(&mut store, "students", "idx_id", "id", IndexKind::BTree, false)
        .unwrap();
    let stmt = parse_sql("CREATE INDEX idx_id_2 ON students(id);").unwrap().remove(0);
    let err = plan(stmt, &catalog).unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}
