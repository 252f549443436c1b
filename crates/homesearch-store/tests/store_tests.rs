use tempfile::TempDir;

use homesearch_core::error::Error;
use homesearch_core::traits::PropertyStore;
use homesearch_core::types::{PropertyRecord, Value};
use homesearch_store::SqliteStore;

fn listing(address: &str, price: f64, bedrooms: i64, new_home: bool) -> PropertyRecord {
    PropertyRecord {
        address: address.to_string(),
        price,
        bedrooms,
        bathrooms: 1,
        property_type: "Flat".to_string(),
        property_type_full_description: format!("{bedrooms} bed flat"),
        flood_risk: "Low".to_string(),
        crime_score_weight: 2.5,
        is_new_home: new_home,
        laua: "Camden".to_string(),
        listing_update_date: "2024-01-01".to_string(),
    }
}

fn seeded(tmp: &TempDir) -> std::path::PathBuf {
    let path = tmp.path().join("nested/properties.db");
    let store = SqliteStore::create(&path, "properties").expect("create");
    let written = store
        .replace_table(&[
            listing("1 High Street", 250000.0, 2, true),
            listing("2 Low Road", 400000.0, 3, false),
            listing("", 100000.0, 1, false),
        ])
        .expect("write");
    assert_eq!(written, 3);
    path
}

#[test]
fn open_discovers_table_and_binds_params() {
    let tmp = TempDir::new().unwrap();
    let path = seeded(&tmp);

    let store = SqliteStore::open(&path).expect("open");
    assert_eq!(store.table_name(), "properties");

    let rows = store
        .fetch_rows(
            "SELECT * FROM \"properties\" WHERE bedrooms >= ? ORDER BY price",
            &[Value::Integer(2)],
        )
        .expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("address"), Some(&Value::Text("1 High Street".into())));
    assert_eq!(rows[0].get("is_new_home"), Some(&Value::Bool(true)));
    assert_eq!(rows[1].get("price"), Some(&Value::Real(400000.0)));
    let columns: Vec<&str> = rows[0].columns().collect();
    assert_eq!(columns.first(), Some(&"address"));
    assert_eq!(columns.len(), 11);
}

#[test]
fn bound_text_is_never_interpreted_as_sql() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&seeded(&tmp)).expect("open");
    let rows = store
        .fetch_rows(
            "SELECT * FROM \"properties\" WHERE LOWER(address) LIKE ?",
            &[Value::Text("%'; drop table properties; --%".into())],
        )
        .expect("rows");
    assert!(rows.is_empty());
    assert_eq!(store.fetch_rows("SELECT * FROM \"properties\"", &[]).expect("rows").len(), 3);
}

#[test]
fn distinct_addresses_skip_empty_values_and_keep_table_order() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&seeded(&tmp)).expect("open");
    let addresses = store.distinct_addresses().expect("addresses");
    assert_eq!(addresses, vec!["1 High Street".to_string(), "2 Low Road".to_string()]);
}

#[test]
fn replace_table_overwrites_previous_rows() {
    let tmp = TempDir::new().unwrap();
    let path = seeded(&tmp);
    let store = SqliteStore::create(&path, "properties").expect("reopen");
    store.replace_table(&[listing("9 New Lane", 1.0, 1, false)]).expect("rewrite");
    let rows = store.fetch_rows("SELECT address FROM \"properties\"", &[]).expect("rows");
    assert_eq!(rows.len(), 1);
}

#[test]
fn missing_database_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = SqliteStore::open(&tmp.path().join("absent.db")).err().expect("missing db");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn database_without_tables_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.db");
    rusqlite::Connection::open(&path).unwrap().execute_batch("PRAGMA user_version = 1;").unwrap();
    let err = SqliteStore::open(&path).err().expect("no tables");
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn bad_sql_is_a_store_error() {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&seeded(&tmp)).expect("open");
    let err = store.fetch_rows("SELECT * FROM nowhere", &[]).expect_err("bad table");
    assert!(matches!(err, Error::Store(_)));
}
