use super::*;

#[test]
fn parses_create_table() {
    let stmts = parse_sql("CREATE TABLE students (id INT, name VARCHAR);").unwrap();
    assert_eq!(stmts.len(), 1);
    match &stmts[0] {
        Statement::CreateTable { name, columns } => {
            assert_eq!(name, "students");
            assert_eq!(columns.len(), 2);
            assert_eq!(columns[0].name, "id");
            assert_eq!(columns[0].ty, SqlType::Int);
            assert_eq!(columns[1].name, "name");
            assert_eq!(columns[1].ty, SqlType::Varchar);
        }
        other => panic!("expected CreateTable, got {other:?}"),
    }
}

#[test]
fn parses_create_unique_index() {
    let stmts = parse_sql("CREATE UNIQUE INDEX idx_id ON students(id);").unwrap();
    match &stmts[0] {
        Statement::CreateIndex { name, table, column, unique } => {
            assert_eq!(name, "idx_id");
            assert_eq!(table, "students");
            assert_eq!(column, "id");
            assert!(*unique);
        }
        other => panic!("expected CreateIndex, got {other:?}"),
    }
}

#[test]
fn parses_create_index_without_unique() {
    let stmts = parse_sql("CREATE INDEX idx_name ON students(name);").unwrap();
    match &stmts[0] {
        Statement::CreateIndex { unique, .. } => assert!(!*unique),
        other => panic!("expected CreateIndex, got {other:?}"),
    }
}

#[test]
fn parses_drop_index() {
    let stmts = parse_sql("DROP INDEX idx_id;").unwrap();
    match &stmts[0] {
        Statement::DropIndex { name } => assert_eq!(name, "idx_id"),
        other => panic!("expected DropIndex, got {other:?}"),
    }
}

#[test]
fn parses_insert_with_column_list() {
    let stmts = parse_sql("INSERT INTO students (id, name) VALUES (1, 'Ada');").unwrap();
    match &stmts[0] {
        Statement::Insert { table, columns, values } => {
            assert_eq!(table, "students");
            assert_eq!(columns, &vec!["id".to_string(), "name".to_string()]);
            assert_eq!(values.len(), 2);
            assert_eq!(values[0], Expr::Literal(Value::Text("1".to_string())));
            assert_eq!(values[1], Expr::Literal(Value::Text("Ada".to_string())));
        }
        other => panic!("expected Insert, got {other:?}"),
    }
}

#[test]
fn insert_column_value_count_mismatch_is_a_semantic_error() {
    let err = parse_sql("INSERT INTO students (id, name) VALUES (1);").unwrap_err();
    assert!(matches!(err, DbError::Semantic(_)));
}

#[test]
fn parses_select_wildcard() {
    let stmts = parse_sql("SELECT * FROM students;").unwrap();
    match &stmts[0] {
        Statement::Select { items, table, selection, .. } => {
            assert_eq!(items, &vec![SelectItem::Wildcard]);
            assert_eq!(table, "students");
            assert!(selection.is_none());
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_select_with_where_clause() {
    let stmts = parse_sql("SELECT id, name FROM students WHERE age > 20;").unwrap();
    match &stmts[0] {
        Statement::Select { items, selection, .. } => {
            assert_eq!(
                items,
                &vec![
                    SelectItem::Column("id".to_string()),
                    SelectItem::Column("name".to_string()),
                ]
            );
            let cond = selection.as_ref().expect("WHERE required");
            match cond {
                Expr::Binary { left, op, right } => {
                    assert_eq!(**left, Expr::Column { table: None, name: "age".to_string() });
                    assert_eq!(*op, BinaryOp::Gt);
                    assert_eq!(**right, Expr::Literal(Value::Text("20".to_string())));
                }
                other => panic!("expected Binary, got {other:?}"),
            }
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_where_with_and_or_left_associatively() {
    let stmts =
        parse_sql("SELECT * FROM students WHERE age > 20 AND age < 30 OR name = 'Ada';").unwrap();
    match &stmts[0] {
        Statement::Select { selection, .. } => {
            let cond = selection.as_ref().unwrap();
            match cond {
                Expr::Binary { op: BinaryOp::Or, left, .. } => match left.as_ref() {
                    Expr::Binary { op: BinaryOp::And, .. } => {}
                    other => panic!("expected left-associative AND, got {other:?}"),
                },
                other => panic!("expected top-level OR, got {other:?}"),
            }
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_aggregate_with_group_by_and_alias() {
    let stmts =
        parse_sql("SELECT name, COUNT(*) AS total FROM students GROUP BY name;").unwrap();
    match &stmts[0] {
        Statement::Select { items, group_by, .. } => {
            assert_eq!(group_by, &vec!["name".to_string()]);
            match &items[1] {
                SelectItem::Aggregate { func, arg, alias } => {
                    assert_eq!(*func, AggFunc::Count);
                    assert_eq!(*arg, AggArg::Star);
                    assert_eq!(alias.as_deref(), Some("total"));
                }
                other => panic!("expected Aggregate, got {other:?}"),
            }
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_avg_aggregate_without_alias() {
    let stmts = parse_sql("SELECT AVG(age) FROM students;").unwrap();
    match &stmts[0] {
        Statement::Select { items, .. } => match &items[0] {
            SelectItem::Aggregate { func, arg, alias } => {
                assert_eq!(*func, AggFunc::Avg);
                assert_eq!(*arg, AggArg::Column("age".to_string()));
                assert!(alias.is_none());
                assert_eq!(items[0].default_label(), "AVG(age)");
            }
            other => panic!("expected Aggregate, got {other:?}"),
        },
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_order_by_and_limit() {
    let stmts =
        parse_sql("SELECT * FROM students ORDER BY age DESC, name LIMIT 10;").unwrap();
    match &stmts[0] {
        Statement::Select { order_by, limit, .. } => {
            assert_eq!(order_by.len(), 2);
            assert_eq!(order_by[0].column, "age");
            assert_eq!(order_by[0].direction, SortDirection::Desc);
            assert_eq!(order_by[1].column, "name");
            assert_eq!(order_by[1].direction, SortDirection::Asc);
            assert_eq!(*limit, Some(10));
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parses_update_with_multiple_assignments() {
    let stmts = parse_sql("UPDATE students SET name = 'Grace', age = 31 WHERE id = 1;").unwrap();
    match &stmts[0] {
        Statement::Update { table, assignments, selection } => {
            assert_eq!(table, "students");
            assert_eq!(assignments.len(), 2);
            assert_eq!(assignments[0].0, "name");
            assert!(selection.is_some());
        }
        other => panic!("expected Update, got {other:?}"),
    }
}

#[test]
fn parses_delete_without_where() {
    let stmts = parse_sql("DELETE FROM students;").unwrap();
    match &stmts[0] {
        Statement::Delete { table, selection } => {
            assert_eq!(table, "students");
            assert!(selection.is_none());
        }
        other => panic!("expected Delete, got {other:?}"),
    }
}

#[test]
fn parses_multiple_statements_separated_by_semicolons() {
    let stmts = parse_sql(
        "CREATE TABLE t (id INT); INSERT INTO t (id) VALUES (1); SELECT * FROM t;;",
    )
    .unwrap();
    assert_eq!(stmts.len(), 3);
}

#[test]
fn parenthesized_condition_overrides_left_associativity() {
    let stmts =
        parse_sql("SELECT * FROM students WHERE age > 20 AND (name = 'Ada' OR name = 'Lin');")
            .unwrap();
    match &stmts[0] {
        Statement::Select { selection, .. } => {
            let cond = selection.as_ref().unwrap();
            match cond {
                Expr::Binary { op: BinaryOp::And, right, .. } => match right.as_ref() {
                    Expr::Binary { op: BinaryOp::Or, .. } => {}
                    other => panic!("expected parenthesized OR on the right, got {other:?}"),
                },
                other => panic!("expected top-level AND, got {other:?}"),
            }
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn unknown_token_surfaces_as_parse_error() {
    let err = parse_sql("SELECT # FROM students;").unwrap_err();
    assert!(matches!(err, DbError::Parse { .. }));
}

#[test]
fn missing_from_surfaces_as_parse_error_naming_expectation() {
    let err = parse_sql("SELECT id students;").unwrap_err();
    match err {
        DbError::Parse { expected, .. } => assert_eq!(expected, "FROM"),
        other => panic!("expected Parse error, got {other:?}"),
    }
}
