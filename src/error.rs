use std::fmt;
use std::io;

/// Custom error type for user-stream operations
#[derive(Debug)]
pub enum Error {
    /// I/O error from underlying file operations
    Io(io::Error),
    /// Opening or closing the store failed
    Connection(String),
    /// Query failed inside SQLite (missing table, missing column, ...)
    Sql(rusqlite::Error),
    /// `user_data` has a shape no scan can walk in key order
    UnsupportedTable(String),
    /// Row that cannot be decoded into a user record
    MalformedRow { row: i64, reason: String },
    /// Batch or page size that is zero or negative
    InvalidBatchSize(i64),
    /// Config file could not be parsed or failed validation
    Config(String),
    /// Seed file could not be read or parsed
    Csv(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::Connection(msg) => write!(f, "Connection error: {msg}"),
            Error::Sql(err) => write!(f, "SQL error: {err}"),
            Error::UnsupportedTable(msg) => write!(f, "Unsupported table: {msg}"),
            Error::MalformedRow { row, reason } => write!(f, "Malformed row {row}: {reason}"),
            Error::InvalidBatchSize(size) => {
                write!(f, "Invalid batch size: {size} (must be greater than 0)")
            }
            Error::Config(msg) => write!(f, "Config error: {msg}"),
            Error::Csv(msg) => write!(f, "CSV error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Sql(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sql(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err.to_string())
    }
}

/// Result type for user-stream operations
pub type Result<T> = std::result::Result<T, Error>;
