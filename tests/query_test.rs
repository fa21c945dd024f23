//! Integration tests for the insert, delete and select entry points.

use heapstore::heap::{create_heap_file, Datatype, HeapFile, Operator};
use heapstore::query::{self, AttrDesc, Condition};
use heapstore::{Database, DbConfig, Error};
use tempfile::tempdir;

fn emp_schema() -> Vec<AttrDesc> {
    vec![
        AttrDesc::new("emp", "id", 0, Datatype::Integer, 4),
        AttrDesc::new("emp", "salary", 4, Datatype::Float, 4),
        AttrDesc::new("emp", "name", 8, Datatype::Text, 12),
    ]
}

fn create_emp_db() -> (Database, Vec<AttrDesc>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let db = Database::open(DbConfig::new(dir.path()).with_pool_size(8)).unwrap();
    create_heap_file(&db, "emp").unwrap();

    let schema = emp_schema();
    for (id, salary, name) in [
        ("1", "1000.0", "ada"),
        ("2", "2500.5", "brian"),
        ("3", "4000", "claude"),
        ("4", "1500", "dennis"),
        ("5", "3200.25", "edsger"),
    ] {
        query::insert(&db, &schema, &[("name", name), ("id", id), ("salary", salary)]).unwrap();
    }
    (db, schema, dir)
}

fn all_records(db: &Database, relation: &str) -> Vec<Vec<u8>> {
    let mut heap = HeapFile::open(db, relation).unwrap();
    let records = heap
        .scan()
        .unwrap()
        .records()
        .map(|item| item.unwrap().1)
        .collect();
    heap.close().unwrap();
    records
}

fn id_of(record: &[u8]) -> i32 {
    i32::from_le_bytes(record[..4].try_into().unwrap())
}

// ============================================================================
// Insert
// ============================================================================

#[test]
fn test_insert_lays_out_fields() {
    let (db, schema, _dir) = create_emp_db();
    let records = all_records(&db, "emp");
    assert_eq!(records.len(), 5);

    let brian = &records[1];
    assert_eq!(brian.len(), 20);
    assert_eq!(schema[0].extract(brian).unwrap(), 2i32.to_le_bytes());
    assert_eq!(schema[1].extract(brian).unwrap(), 2500.5f32.to_le_bytes());
    assert_eq!(schema[2].extract(brian).unwrap(), b"brian\0\0\0\0\0\0\0");
}

#[test]
fn test_insert_rejects_bad_values() {
    let (db, schema, _dir) = create_emp_db();

    let missing = query::insert(&db, &schema, &[("id", "6"), ("name", "frances")]);
    assert!(matches!(missing, Err(Error::MissingAttribute(attr)) if attr == "salary"));

    let invalid = query::insert(
        &db,
        &schema,
        &[("id", "six"), ("salary", "1"), ("name", "frances")],
    );
    assert!(matches!(invalid, Err(Error::InvalidValue { attr, .. }) if attr == "id"));

    assert!(matches!(query::insert(&db, &[], &[]), Err(Error::BadScanParam(_))));
    assert_eq!(all_records(&db, "emp").len(), 5);
}

// ============================================================================
// Select
// ============================================================================

#[test]
fn test_select_projects_matching_records() {
    let (db, schema, _dir) = create_emp_db();
    let projection = [schema[2].clone(), schema[0].clone()];
    let condition = Condition::new(&schema[1], Operator::Gte, "2500.5");

    let selected = query::select(&db, "rich", &projection, Some(condition)).unwrap();
    assert_eq!(selected, 3);

    let rows = all_records(&db, "rich");
    assert_eq!(rows.len(), 3);
    let ids: Vec<i32> = rows
        .iter()
        .map(|r| i32::from_le_bytes(r[12..16].try_into().unwrap()))
        .collect();
    assert_eq!(ids, vec![2, 3, 5]);
    assert_eq!(&rows[1][..6], b"claude");
    assert!(rows.iter().all(|r| r.len() == 16));
}

#[test]
fn test_select_without_condition_copies_all() {
    let (db, schema, _dir) = create_emp_db();
    assert_eq!(query::select(&db, "copy", &schema, None).unwrap(), 5);
    assert_eq!(all_records(&db, "copy"), all_records(&db, "emp"));

    // Appends to an existing result
    assert_eq!(query::select(&db, "copy", &schema, None).unwrap(), 5);
    assert_eq!(all_records(&db, "copy").len(), 10);
}

#[test]
fn test_select_rejects_bad_requests() {
    let (db, schema, _dir) = create_emp_db();

    assert!(matches!(query::select(&db, "out", &[], None), Err(Error::BadScanParam(_))));
    assert!(matches!(query::select(&db, "emp", &schema, None), Err(Error::BadScanParam(_))));

    let other = AttrDesc::new("dept", "id", 0, Datatype::Integer, 4);
    let mixed = [schema[0].clone(), other.clone()];
    assert!(matches!(query::select(&db, "out", &mixed, None), Err(Error::BadScanParam(_))));

    let foreign = Condition::new(&other, Operator::Eq, "1");
    assert!(matches!(
        query::select(&db, "out", &schema, Some(foreign)),
        Err(Error::BadScanParam(_))
    ));
    assert!(!db.files().exists("out"));
}

// ============================================================================
// Delete
// ============================================================================

#[test]
fn test_delete_with_condition() {
    let (db, schema, _dir) = create_emp_db();
    let cheap = Condition::new(&schema[1], Operator::Lt, "2000");

    assert_eq!(query::delete(&db, "emp", Some(cheap)).unwrap(), 2);
    let ids: Vec<i32> = all_records(&db, "emp").iter().map(|r| id_of(r)).collect();
    assert_eq!(ids, vec![2, 3, 5]);

    let by_name = Condition::new(&schema[2], Operator::Eq, "claude");
    assert_eq!(query::delete(&db, "emp", Some(by_name)).unwrap(), 1);
    assert_eq!(query::delete(&db, "emp", Some(by_name)).unwrap(), 0);

    let mut heap = HeapFile::open(&db, "emp").unwrap();
    assert_eq!(heap.record_count(), 2);
    heap.close().unwrap();
}

#[test]
fn test_delete_all_and_reuse() {
    let (db, schema, _dir) = create_emp_db();
    assert_eq!(query::delete(&db, "emp", None).unwrap(), 5);
    assert!(all_records(&db, "emp").is_empty());

    query::insert(&db, &schema, &[("id", "9"), ("salary", "1"), ("name", "grace")]).unwrap();
    let records = all_records(&db, "emp");
    assert_eq!(records.len(), 1);
    assert_eq!(id_of(&records[0]), 9);
}

#[test]
fn test_delete_unknown_relation() {
    let (db, _schema, _dir) = create_emp_db();
    assert!(matches!(
        query::delete(&db, "nobody", None),
        Err(Error::FileNotFound(_))
    ));
}
