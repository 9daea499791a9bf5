use super::*;
use common::RecordId;
use types::Value;

fn rid(page_id: u32, offset: u32) -> RecordId {
    RecordId { page_id, offset }
}

#[test]
fn empty_tree_has_no_matches() {
    let tree = BPlusTree::new(3);
    assert!(tree.search(&Value::Int(1)).is_empty());
    assert!(tree.is_empty());
}

#[test]
fn insert_and_search_single_key() {
    let mut tree = BPlusTree::new(3);
    let r = rid(0, 80);
    tree.insert(Value::Int(42), r).unwrap();

    assert_eq!(tree.search(&Value::Int(42)), vec![r]);
    assert!(tree.search(&Value::Int(99)).is_empty());
    assert_eq!(tree.len(), 1);
}

#[test]
fn insert_many_keys_forces_splits_and_preserves_order() {
    let mut tree = BPlusTree::new(3);
    for i in 0..50 {
        tree.insert(Value::Int(i), rid(0, i as u32)).unwrap();
    }
    assert_eq!(tree.len(), 50);

    for i in 0..50 {
        assert_eq!(tree.search(&Value::Int(i)), vec![rid(0, i as u32)]);
    }

    let scanned = tree.scan_all();
    assert_eq!(scanned.len(), 50);
    let keys: Vec<i32> = scanned.iter().map(|(k, _)| k.as_int().unwrap()).collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]), "leaf chain must stay sorted");
}

#[test]
fn range_scan_respects_bounds() {
    let mut tree = BPlusTree::new(3);
    for i in 0..20 {
        tree.insert(Value::Int(i), rid(0, i as u32)).unwrap();
    }

    let results = tree.range_scan(Some(&Value::Int(5)), Some(&Value::Int(10)));
    assert_eq!(results.len(), 6);
    for r in &results {
        assert!(r.offset >= 5 && r.offset <= 10);
    }
}

#[test]
fn unbounded_range_scan_returns_everything() {
    let mut tree = BPlusTree::new(3);
    for i in 0..12 {
        tree.insert(Value::Int(i), rid(0, i as u32)).unwrap();
    }
    assert_eq!(tree.range_scan(None, None).len(), 12);
}

#[test]
fn delete_removes_a_matching_entry_only() {
    let mut tree = BPlusTree::new(3);
    let a = rid(0, 1);
    let b = rid(0, 2);
    tree.insert(Value::Int(5), a).unwrap();
    tree.insert(Value::Int(5), b).unwrap();

    assert!(tree.delete(&Value::Int(5), a));
    assert_eq!(tree.search(&Value::Int(5)), vec![b]);
    assert_eq!(tree.len(), 1);
}

#[test]
fn delete_missing_entry_returns_false() {
    let mut tree = BPlusTree::new(3);
    tree.insert(Value::Int(1), rid(0, 1)).unwrap();
    assert!(!tree.delete(&Value::Int(2), rid(0, 1)));
}

#[test]
fn text_keys_compare_lexicographically() {
    let mut tree = BPlusTree::new(3);
    for name in ["delta", "alpha", "charlie", "bravo"] {
        tree.insert(Value::Text(name.into()), rid(0, 0)).unwrap();
    }
    let scanned = tree.scan_all();
    let names: Vec<&str> = scanned.iter().map(|(k, _)| k.as_text().unwrap()).collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie", "delta"]);
}

#[test]
fn check_key_type_rejects_null() {
    assert!(check_key_type(&Value::Null).is_err());
    assert!(check_key_type(&Value::Int(1)).is_ok());
}
