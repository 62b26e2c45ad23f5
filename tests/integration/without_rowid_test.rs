use std::path::Path;

use tempfile::TempDir;
use user_stream::{
    batch_processing, calculate_average_age, lazy_paginate, paginate_users, stream_users, Error,
    NameMap, Result, Store, UserRecord,
};

/// Build a `WITHOUT ROWID` user_data table; rows are stored in `user_id` order.
fn create_without_rowid_db(path: &Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE user_data (
             user_id TEXT PRIMARY KEY,
             name TEXT NOT NULL,
             email TEXT NOT NULL,
             age REAL NOT NULL
         ) WITHOUT ROWID;
         INSERT INTO user_data VALUES ('u-3', 'Glenda Wisozk', 'glenda@example.com', 40);
         INSERT INTO user_data VALUES ('u-1', 'Ann', 'ann@example.com', 20);
         INSERT INTO user_data VALUES ('u-2', 'Bo', 'bo@example.com', 30);",
    )
    .unwrap();
}

fn ids(users: &[UserRecord]) -> Vec<&str> {
    users.iter().map(|u| u.user_id.as_str()).collect()
}

#[test]
fn test_row_stream_over_without_rowid_table() -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("without_rowid.db");
    create_without_rowid_db(&path);

    let store = Store::open(&path)?;
    let map = NameMap::default();
    let users = stream_users(&store, &map)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(ids(&users), vec!["u-1", "u-2", "u-3"]);
    assert_eq!(users[2].name, "Elias Tekle");
    store.close()
}

#[test]
fn test_pipelines_over_without_rowid_table() -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("without_rowid.db");
    create_without_rowid_db(&path);

    let store = Store::open(&path)?;
    let filtered = batch_processing(&store, 2, 25.0)?;
    assert_eq!(ids(&filtered), vec!["u-2", "u-3"]);

    assert_eq!(
        calculate_average_age(&store)?.to_string(),
        "Average age of users: 30.00"
    );
    store.close()
}

#[test]
fn test_pagination_over_without_rowid_table() -> Result<()> {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("without_rowid.db");
    create_without_rowid_db(&path);

    let store = Store::open(&path)?;
    assert_eq!(ids(&paginate_users(&store, 2, 1)?), vec!["u-2", "u-3"]);

    let pages = lazy_paginate(&store, 2)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(pages.len(), 2);
    assert_eq!(ids(&pages.concat()), vec!["u-1", "u-2", "u-3"]);
    store.close()
}

#[test]
fn test_composite_key_table_is_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("composite.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE user_data (
             user_id TEXT, name TEXT, email TEXT, age REAL,
             PRIMARY KEY (email, user_id)
         ) WITHOUT ROWID;",
    )
    .unwrap();
    drop(conn);

    let store = Store::open(&path).unwrap();
    match calculate_average_age(&store) {
        Err(Error::UnsupportedTable(msg)) => assert!(msg.contains("email, user_id")),
        other => panic!("expected UnsupportedTable, got {other:?}"),
    }
    assert!(matches!(
        paginate_users(&store, 2, 0),
        Err(Error::UnsupportedTable(_))
    ));
}
