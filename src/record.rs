//! Typed rows of the `user_data` table

use crate::error::{Error, Result};
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the backing table
pub const USER_TABLE: &str = "user_data";

/// Alias the scans give to the scan key column, the cursor position
pub(crate) const ROW_KEY: &str = "row_key";

/// One row of `user_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub age: f64,
}

impl UserRecord {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        age: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Decode the `user_id, name, email, age` columns of a row. `number` is
    /// the row reported if a column is malformed.
    pub(crate) fn from_row(row: &rusqlite::Row<'_>, number: i64) -> Result<Self> {
        Ok(Self {
            user_id: text_column(number, "user_id", row.get_ref("user_id")?)?,
            name: text_column(number, "name", row.get_ref("name")?)?,
            email: text_column(number, "email", row.get_ref("email")?)?,
            age: age_from_value(number, row.get_ref("age")?)?,
        })
    }
}

impl fmt::Display for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "('{}', '{}', '{}', {})",
            self.user_id, self.name, self.email, self.age
        )
    }
}

/// Parse an age written as text. `NaN` and infinities are not ages.
pub(crate) fn parse_age(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|age| age.is_finite())
}

/// Ages are stored as INTEGER, REAL or numeric TEXT; anything else is malformed.
pub(crate) fn age_from_value(row: i64, value: ValueRef<'_>) -> Result<f64> {
    match value {
        ValueRef::Integer(i) => Ok(i as f64),
        ValueRef::Real(f) => Ok(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            parse_age(&text).ok_or_else(|| Error::MalformedRow {
                row,
                reason: format!("age '{text}' is not numeric"),
            })
        }
        ValueRef::Null => Err(Error::MalformedRow {
            row,
            reason: "age is NULL".to_string(),
        }),
        ValueRef::Blob(_) => Err(Error::MalformedRow {
            row,
            reason: "age is a BLOB".to_string(),
        }),
    }
}

fn text_column(row: i64, column: &str, value: ValueRef<'_>) -> Result<String> {
    match value {
        ValueRef::Text(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Integer(i) => Ok(i.to_string()),
        ValueRef::Real(f) => Ok(f.to_string()),
        ValueRef::Null => Err(Error::MalformedRow {
            row,
            reason: format!("{column} is NULL"),
        }),
        ValueRef::Blob(_) => Err(Error::MalformedRow {
            row,
            reason: format!("{column} is a BLOB"),
        }),
    }
}
