//! Connection provider and keyset cursors
//!
//! A [`Store`] owns one SQLite connection for the lifetime of a pipeline
//! invocation. Streams never own the connection; they borrow the store and pull
//! rows through a [`Cursor`], which remembers the key of the last row it
//! returned and fetches the next `n` rows in ascending key order.
//!
//! The key is `rowid`, SQLite's natural scan order, so a full pass of a cursor
//! is a full table scan without holding a statement open between pulls. A
//! `WITHOUT ROWID` table has no `rowid`; it is walked in primary-key order
//! instead, which is how SQLite stores it.

use crate::error::{Error, Result};
use crate::record::{age_from_value, UserRecord, ROW_KEY, USER_TABLE};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Open handle to the backing store
pub struct Store {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| Error::Connection(format!("cannot open {}: {e}", path.display())))?;
        debug!(path = %path.display(), "opened store");
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Connection(format!("cannot open in-memory store: {e}")))?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Start a full-table scan of `T`'s columns.
    ///
    /// The scan statements are prepared here, so a missing table or column is
    /// reported before the first fetch.
    pub fn cursor<T: ScanRow>(&self) -> Result<Cursor<'_, T>> {
        Cursor::execute(&self.conn)
    }

    /// Close the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| Error::Connection(format!("close failed: {e}")))?;
        debug!(path = ?path, "closed store");
        Ok(())
    }
}

/// Column a scan orders on and resumes after
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScanKey {
    Rowid,
    /// Quoted primary-key column of a `WITHOUT ROWID` table
    PrimaryKey(String),
}

impl ScanKey {
    /// Pick the key for `user_data` as it is declared in `conn`.
    ///
    /// A missing table yields [`ScanKey::Rowid`]; preparing the scan then
    /// reports the missing table.
    pub(crate) fn detect(conn: &Connection) -> Result<Self> {
        let without_rowid: Option<bool> = conn
            .query_row(
                "SELECT wr FROM pragma_table_list WHERE name = ?1",
                params![USER_TABLE],
                |row| row.get(0),
            )
            .optional()?;
        if without_rowid != Some(true) {
            return Ok(ScanKey::Rowid);
        }

        let mut stmt =
            conn.prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")?;
        let columns = stmt
            .query_map(params![USER_TABLE], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        match columns.as_slice() {
            [column] => Ok(ScanKey::PrimaryKey(quote_ident(column))),
            _ => Err(Error::UnsupportedTable(format!(
                "{USER_TABLE} is WITHOUT ROWID with a composite primary key ({})",
                columns.join(", ")
            ))),
        }
    }

    pub(crate) fn column(&self) -> &str {
        match self {
            ScanKey::Rowid => "rowid",
            ScanKey::PrimaryKey(column) => column,
        }
    }

    /// Row number reported for a malformed row: its `rowid` when the table
    /// has one, otherwise its 1-based position in the scan.
    pub(crate) fn row_number(&self, key: &Value, position: u64) -> i64 {
        match (self, key) {
            (ScanKey::Rowid, Value::Integer(rowid)) => *rowid,
            _ => i64::try_from(position).unwrap_or(i64::MAX),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::record::UserRecord {}
    impl Sealed for f64 {}
}

/// Row shapes a [`Cursor`] can scan: whole [`UserRecord`]s or bare ages
/// (`f64`). This trait is sealed.
pub trait ScanRow: sealed::Sealed + Sized {
    /// Columns selected after the row key
    const COLUMNS: &'static str;

    /// Decode one row; `number` identifies it in a `MalformedRow` error
    fn decode(row: &rusqlite::Row<'_>, number: i64) -> Result<Self>;
}

impl ScanRow for UserRecord {
    const COLUMNS: &'static str = "user_id, name, email, age";

    fn decode(row: &rusqlite::Row<'_>, number: i64) -> Result<Self> {
        UserRecord::from_row(row, number)
    }
}

/// Bare age column
impl ScanRow for f64 {
    const COLUMNS: &'static str = "age";

    fn decode(row: &rusqlite::Row<'_>, number: i64) -> Result<Self> {
        age_from_value(number, row.get_ref("age")?)
    }
}

/// Forward-only scan over `user_data`
pub struct Cursor<'conn, T: ScanRow> {
    conn: &'conn Connection,
    key: ScanKey,
    /// First fetch, no lower bound
    first_sql: String,
    /// Every later fetch, resuming after `last_key`
    next_sql: String,
    last_key: Option<Value>,
    fetched: u64,
    closed: bool,
    pending: Option<Error>,
    _row: PhantomData<T>,
}

impl<'conn, T: ScanRow> Cursor<'conn, T> {
    fn execute(conn: &'conn Connection) -> Result<Self> {
        let key = ScanKey::detect(conn)?;
        let column = key.column();
        let select = format!(
            "SELECT {column} AS {ROW_KEY}, {} FROM {USER_TABLE}",
            T::COLUMNS
        );
        let first_sql = format!("{select} ORDER BY {column} LIMIT ?1");
        let next_sql = format!("{select} WHERE {column} > ?1 ORDER BY {column} LIMIT ?2");
        conn.prepare_cached(&first_sql)?;
        conn.prepare_cached(&next_sql)?;
        debug!(columns = T::COLUMNS, key = column, "cursor opened");
        Ok(Self {
            conn,
            key,
            first_sql,
            next_sql,
            last_key: None,
            fetched: 0,
            closed: false,
            pending: None,
            _row: PhantomData,
        })
    }

    /// Fetch up to `n` rows. An empty result means the scan is exhausted and
    /// releases the cursor; a closed cursor always returns an empty result.
    ///
    /// Rows decoded before a malformed row are returned first; the decode
    /// error is reported by the following call. Any error releases the cursor.
    pub fn fetch_many(&mut self, n: NonZeroUsize) -> Result<Vec<T>> {
        if let Some(err) = self.pending.take() {
            self.close();
            return Err(err);
        }
        if self.closed {
            return Ok(Vec::new());
        }

        let batch = match self.read_batch(n) {
            Ok(batch) => batch,
            Err(err) => {
                self.close();
                return Err(err);
            }
        };
        self.fetched += batch.len() as u64;

        if batch.is_empty() {
            self.close();
        }
        Ok(batch)
    }

    fn read_batch(&mut self, n: NonZeroUsize) -> Result<Vec<T>> {
        let limit = i64::try_from(n.get()).unwrap_or(i64::MAX);
        let conn = self.conn;
        let sql = match self.last_key {
            Some(_) => &self.next_sql,
            None => &self.first_sql,
        };
        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = match &self.last_key {
            Some(last) => stmt.query(params![last, limit])?,
            None => stmt.query(params![limit])?,
        };

        let mut batch = Vec::with_capacity(n.get().min(1024));
        while let Some(row) = rows.next()? {
            let key: Value = row.get(ROW_KEY)?;
            let number = self
                .key
                .row_number(&key, self.fetched + batch.len() as u64 + 1);
            match T::decode(row, number) {
                Ok(value) => {
                    self.last_key = Some(key);
                    batch.push(value);
                }
                Err(err) if batch.is_empty() => return Err(err),
                Err(err) => {
                    self.pending = Some(err);
                    break;
                }
            }
        }
        Ok(batch)
    }

    /// Rows returned so far
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the cursor. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!(rows = self.fetched, "cursor released");
        }
    }
}

impl<T: ScanRow> Drop for Cursor<'_, T> {
    fn drop(&mut self) {
        if !self.closed {
            debug!(rows = self.fetched, "cursor dropped before exhaustion");
            self.close();
        }
    }
}
