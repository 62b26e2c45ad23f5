mod test_helpers {
    include!("../common/test_helpers.rs");
}
use test_helpers::{run_with_users, sample_users};

use user_stream::{stream_users, Error, NameMap, Result, Store, UserRecord};

#[test]
fn test_stream_emits_every_row_in_scan_order() -> Result<()> {
    run_with_users("test_stream_emits_every_row_in_scan_order", sample_users(150), |store| {
        let map = NameMap::default();
        let users = stream_users(store, &map)?.collect::<Result<Vec<_>>>()?;

        assert_eq!(users.len(), 150);
        assert_eq!(users, sample_users(150));
        Ok(())
    })
}

#[test]
fn test_stream_replaces_mapped_names_only() -> Result<()> {
    let users = vec![
        UserRecord::new("1", "Dan Altenwerth Jr.", "dan@example.com", 44.0),
        UserRecord::new("2", "Grace Hopper", "grace@example.com", 85.0),
        UserRecord::new("3", "Ronnie Bechtelar", "ronnie@example.com", 19.0),
    ];
    run_with_users("test_stream_replaces_mapped_names_only", users.clone(), |store| {
        let map = NameMap::default();
        let streamed = stream_users(store, &map)?.collect::<Result<Vec<_>>>()?;

        assert_eq!(streamed[0].name, "Amina Yusuf");
        assert_eq!(streamed[1].name, "Grace Hopper");
        assert_eq!(streamed[2].name, "Hana Bekele");

        // Everything but the name is untouched
        for (before, after) in users.iter().zip(&streamed) {
            assert_eq!(before.user_id, after.user_id);
            assert_eq!(before.email, after.email);
            assert_eq!(before.age, after.age);
            assert_eq!(after.name, map.resolve(&before.name));
        }
        Ok(())
    })
}

#[test]
fn test_custom_map_is_used() -> Result<()> {
    let users = vec![UserRecord::new("1", "Grace Hopper", "grace@example.com", 85.0)];
    run_with_users("test_custom_map_is_used", users, |store| {
        let map: NameMap = [("Grace Hopper", "Amazing Grace")].into_iter().collect();
        let first = stream_users(store, &map)?.next().expect("one row")?;
        assert_eq!(first.name, "Amazing Grace");
        Ok(())
    })
}

#[test]
fn test_early_termination_releases_cursor() -> Result<()> {
    run_with_users("test_early_termination_releases_cursor", sample_users(10), |store| {
        let map = NameMap::empty();
        let mut stream = stream_users(store, &map)?;
        let first_three: Vec<_> = stream.by_ref().take(3).collect::<Result<_>>()?;
        assert_eq!(first_three.len(), 3);
        stream.close();

        // The store stays usable for a fresh scan
        assert_eq!(stream_users(store, &map)?.count(), 10);
        Ok(())
    })
}

#[test]
fn test_empty_table_streams_nothing() -> Result<()> {
    run_with_users("test_empty_table_streams_nothing", Vec::new(), |store| {
        let map = NameMap::default();
        assert_eq!(stream_users(store, &map)?.count(), 0);
        Ok(())
    })
}

#[test]
fn test_missing_table_is_sql_error() {
    let store = Store::open_in_memory().unwrap();
    let map = NameMap::default();
    assert!(matches!(stream_users(&store, &map), Err(Error::Sql(_))));
}

#[test]
fn test_missing_column_is_sql_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("partial.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE user_data (user_id TEXT, name TEXT, age REAL)")
        .unwrap();
    drop(conn);

    let store = Store::open(&path).unwrap();
    let map = NameMap::default();
    assert!(matches!(stream_users(&store, &map), Err(Error::Sql(_))));
}

#[test]
fn test_malformed_age_stops_the_stream() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("malformed.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE user_data (user_id TEXT, name TEXT, email TEXT, age);
         INSERT INTO user_data VALUES ('1', 'Ann', 'ann@example.com', 31);
         INSERT INTO user_data VALUES ('2', 'Bo', 'bo@example.com', 'unknown');
         INSERT INTO user_data VALUES ('3', 'Cy', 'cy@example.com', 40);",
    )
    .unwrap();
    drop(conn);

    let store = Store::open(&path).unwrap();
    let map = NameMap::empty();
    let mut stream = stream_users(&store, &map).unwrap();
    assert_eq!(stream.next().unwrap().unwrap().name, "Ann");
    match stream.next() {
        Some(Err(Error::MalformedRow { row, .. })) => assert_eq!(row, 2),
        other => panic!("expected MalformedRow, got {other:?}"),
    }
    assert!(stream.next().is_none());
}
