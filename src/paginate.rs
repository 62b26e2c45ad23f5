//! LIMIT/OFFSET pagination over `user_data`

use crate::batch_stream::validate_batch_size;
use crate::error::Result;
use crate::record::{UserRecord, ROW_KEY, USER_TABLE};
use crate::store::{ScanKey, Store};
use rusqlite::params;
use rusqlite::types::Value;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Fetch one page of users starting at `offset`.
pub fn paginate_users(store: &Store, page_size: i64, offset: u64) -> Result<Vec<UserRecord>> {
    let page_size = validate_batch_size(page_size)?;
    fetch_page(store, page_size, offset)
}

fn fetch_page(store: &Store, page_size: NonZeroUsize, offset: u64) -> Result<Vec<UserRecord>> {
    let key = ScanKey::detect(store.connection())?;
    let column = key.column();
    let sql = format!(
        "SELECT {column} AS {ROW_KEY}, user_id, name, email, age FROM {USER_TABLE} \
         ORDER BY {column} LIMIT ?1 OFFSET ?2"
    );
    let limit = i64::try_from(page_size.get()).unwrap_or(i64::MAX);
    let skip = i64::try_from(offset).unwrap_or(i64::MAX);

    let mut stmt = store.connection().prepare_cached(&sql)?;
    let mut rows = stmt.query(params![limit, skip])?;
    let mut page = Vec::new();
    while let Some(row) = rows.next()? {
        let position = offset + page.len() as u64 + 1;
        let number = key.row_number(&row.get::<_, Value>(ROW_KEY)?, position);
        page.push(UserRecord::from_row(row, number)?);
    }
    Ok(page)
}

/// Pages of users, fetched only when pulled; ends after the first empty page
pub struct LazyPaginator<'a> {
    store: &'a Store,
    page_size: NonZeroUsize,
    offset: u64,
    done: bool,
}

pub fn lazy_paginate(store: &Store, page_size: i64) -> Result<LazyPaginator<'_>> {
    Ok(LazyPaginator {
        store,
        page_size: validate_batch_size(page_size)?,
        offset: 0,
        done: false,
    })
}

impl LazyPaginator<'_> {
    /// Offset of the next page to fetch
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Iterator for LazyPaginator<'_> {
    type Item = Result<Vec<UserRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match fetch_page(self.store, self.page_size, self.offset) {
            Ok(page) if page.is_empty() => {
                debug!(offset = self.offset, "pagination finished");
                self.done = true;
                None
            }
            Ok(page) => {
                self.offset += page.len() as u64;
                Some(Ok(page))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for LazyPaginator<'_> {}
