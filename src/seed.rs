//! Creating and populating the `user_data` table
//!
//! Seed files are CSV with a `name,email,age` header. Every inserted row gets a
//! fresh UUID v4 `user_id`. Rows whose email is already present are skipped, so
//! loading the same file twice leaves the table unchanged.

use crate::error::{Error, Result};
use crate::record::{parse_age, UserRecord, USER_TABLE};
use crate::store::Store;
use rusqlite::{params, OptionalExtension, Transaction};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Create `user_data` and its index if they do not exist.
pub fn create_table(store: &Store) -> Result<()> {
    store.connection().execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {USER_TABLE} (
             user_id TEXT PRIMARY KEY,
             name TEXT NOT NULL,
             email TEXT NOT NULL,
             age REAL NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_{USER_TABLE}_user_id ON {USER_TABLE} (user_id);"
    ))?;
    info!(table = USER_TABLE, "table ready");
    Ok(())
}

pub fn table_exists(store: &Store) -> Result<bool> {
    let found = store
        .connection()
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![USER_TABLE],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn count_users(store: &Store) -> Result<u64> {
    let count: i64 = store.connection().query_row(
        &format!("SELECT COUNT(*) FROM {USER_TABLE}"),
        [],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Insert `users` in one transaction, skipping emails already present.
/// Returns the number of rows inserted.
pub fn insert_users<I>(store: &mut Store, users: I) -> Result<usize>
where
    I: IntoIterator<Item = UserRecord>,
{
    let tx = store.connection_mut().transaction()?;
    let mut inserted = 0;
    for (index, user) in users.into_iter().enumerate() {
        if !user.age.is_finite() {
            return Err(Error::MalformedRow {
                row: index as i64 + 1,
                reason: format!("age {} is not a finite number", user.age),
            });
        }
        inserted += insert_one(&tx, &user)?;
    }
    tx.commit()?;
    Ok(inserted)
}

/// Load a `name,email,age` CSV file into `user_data`.
/// Returns the number of rows inserted.
pub fn insert_data<P: AsRef<Path>>(store: &mut Store, csv_path: P) -> Result<usize> {
    let csv_path = csv_path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(csv_path)
        .map_err(|e| Error::Csv(format!("cannot read {}: {e}", csv_path.display())))?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::Csv(format!("missing '{name}' column in header")))
    };
    let (name_col, email_col, age_col) = (column("name")?, column("email")?, column("age")?);

    let tx = store.connection_mut().transaction()?;
    let mut inserted = 0;
    let mut skipped = 0;
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = index as i64 + 2;
        let field = |col: usize, what: &str| {
            record
                .get(col)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::MalformedRow {
                    row: line,
                    reason: format!("missing {what}"),
                })
        };

        let age_text = field(age_col, "age")?;
        let age = parse_age(age_text).ok_or_else(|| Error::MalformedRow {
            row: line,
            reason: format!("age '{age_text}' is not a finite number"),
        })?;
        let user = UserRecord::new(
            Uuid::new_v4().to_string(),
            field(name_col, "name")?,
            field(email_col, "email")?,
            age,
        );

        match insert_one(&tx, &user)? {
            0 => skipped += 1,
            n => inserted += n,
        }
    }
    tx.commit()?;

    if skipped > 0 {
        warn!(skipped, "skipped rows with an email already in the table");
    }
    info!(inserted, file = %csv_path.display(), "seed data loaded");
    Ok(inserted)
}

fn insert_one(tx: &Transaction<'_>, user: &UserRecord) -> Result<usize> {
    let mut stmt = tx.prepare_cached(&format!(
        "INSERT INTO {USER_TABLE} (user_id, name, email, age)
         SELECT ?1, ?2, ?3, ?4
         WHERE NOT EXISTS (SELECT 1 FROM {USER_TABLE} WHERE email = ?3)"
    ))?;
    Ok(stmt.execute(params![user.user_id, user.name, user.email, user.age])?)
}
