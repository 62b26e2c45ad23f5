//! One-record-at-a-time scan with read-time name replacement

use crate::error::Result;
use crate::name_map::NameMap;
use crate::record::UserRecord;
use crate::store::{Cursor, Store};
use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

/// Rows pulled from the store per round trip; records are still yielded one
/// at a time.
pub const DEFAULT_FETCH_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => unreachable!(),
};

/// Lazy stream of remapped user records in scan order
pub struct UserStream<'a> {
    cursor: Cursor<'a, UserRecord>,
    name_map: &'a NameMap,
    buffer: VecDeque<UserRecord>,
    fetch_size: NonZeroUsize,
    done: bool,
}

/// Stream every row of `user_data`, replacing names found in `name_map`.
pub fn stream_users<'a>(store: &'a Store, name_map: &'a NameMap) -> Result<UserStream<'a>> {
    UserStream::with_fetch_size(store, name_map, DEFAULT_FETCH_SIZE)
}

impl<'a> UserStream<'a> {
    pub fn with_fetch_size(
        store: &'a Store,
        name_map: &'a NameMap,
        fetch_size: NonZeroUsize,
    ) -> Result<Self> {
        Ok(Self {
            cursor: store.cursor()?,
            name_map,
            buffer: VecDeque::with_capacity(fetch_size.get()),
            fetch_size,
            done: false,
        })
    }

    /// Stop early and release the cursor
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.done = true;
        self.buffer.clear();
        self.cursor.close();
    }
}

impl Iterator for UserStream<'_> {
    type Item = Result<UserRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.buffer.is_empty() {
            match self.cursor.fetch_many(self.fetch_size) {
                Ok(rows) if rows.is_empty() => {
                    self.finish();
                    return None;
                }
                Ok(rows) => self.buffer.extend(rows),
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            }
        }

        let mut user = self.buffer.pop_front()?;
        user.name = self.name_map.apply(user.name);
        Some(Ok(user))
    }
}

impl FusedIterator for UserStream<'_> {}
