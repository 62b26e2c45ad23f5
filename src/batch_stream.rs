//! Fixed-size batch scans and the age filter built on them

use crate::error::{Error, Result};
use crate::record::UserRecord;
use crate::store::{Cursor, Store};
use std::iter::FusedIterator;
use std::num::NonZeroUsize;
use tracing::{debug, info};

pub const DEFAULT_BATCH_SIZE: i64 = 10;
pub const DEFAULT_MIN_AGE: f64 = 25.0;

/// Reject zero and negative sizes before any query runs.
pub fn validate_batch_size(size: i64) -> Result<NonZeroUsize> {
    usize::try_from(size)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or(Error::InvalidBatchSize(size))
}

/// Lazy sequence of non-empty batches, each at most `batch_size` rows long
pub struct BatchStream<'a> {
    cursor: Cursor<'a, UserRecord>,
    batch_size: NonZeroUsize,
    batches: usize,
    done: bool,
}

/// Stream `user_data` in batches of up to `batch_size` rows.
pub fn stream_users_in_batches(store: &Store, batch_size: i64) -> Result<BatchStream<'_>> {
    let batch_size = validate_batch_size(batch_size)?;
    Ok(BatchStream {
        cursor: store.cursor()?,
        batch_size,
        batches: 0,
        done: false,
    })
}

impl BatchStream<'_> {
    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Stop early and release the cursor
    pub fn close(mut self) {
        self.done = true;
        self.cursor.close();
    }
}

impl Iterator for BatchStream<'_> {
    type Item = Result<Vec<UserRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.cursor.fetch_many(self.batch_size) {
            Ok(batch) if batch.is_empty() => {
                self.done = true;
                debug!(batches = self.batches, "batch stream exhausted");
                None
            }
            Ok(batch) => {
                self.batches += 1;
                Some(Ok(batch))
            }
            Err(e) => {
                self.done = true;
                self.cursor.close();
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for BatchStream<'_> {}

/// Collect every user strictly older than `min_age`, in scan order.
pub fn batch_processing(store: &Store, batch_size: i64, min_age: f64) -> Result<Vec<UserRecord>> {
    let mut filtered = Vec::new();
    let mut scanned = 0usize;

    for batch in stream_users_in_batches(store, batch_size)? {
        let batch = batch?;
        scanned += batch.len();
        filtered.extend(batch.into_iter().filter(|user| user.age > min_age));
    }

    info!(
        scanned,
        matched = filtered.len(),
        min_age,
        "batch processing finished"
    );
    Ok(filtered)
}
