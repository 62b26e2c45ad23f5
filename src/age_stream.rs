//! Single-column age scan and the constant-memory average over it

use crate::error::Result;
use crate::row_stream::DEFAULT_FETCH_SIZE;
use crate::store::{Cursor, Store};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;
use tracing::info;

/// Lazy stream of ages, one per row, in scan order
pub struct AgeStream<'a> {
    cursor: Cursor<'a, f64>,
    buffer: VecDeque<f64>,
    fetch_size: NonZeroUsize,
    done: bool,
}

pub fn stream_user_ages(store: &Store) -> Result<AgeStream<'_>> {
    Ok(AgeStream {
        cursor: store.cursor()?,
        buffer: VecDeque::with_capacity(DEFAULT_FETCH_SIZE.get()),
        fetch_size: DEFAULT_FETCH_SIZE,
        done: false,
    })
}

impl AgeStream<'_> {
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

impl Iterator for AgeStream<'_> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.buffer.is_empty() {
            match self.cursor.fetch_many(self.fetch_size) {
                Ok(ages) if ages.is_empty() => {
                    self.finish();
                    return None;
                }
                Ok(ages) => self.buffer.extend(ages),
                Err(e) => {
                    self.finish();
                    return Some(Err(e));
                }
            }
        }

        self.buffer.pop_front().map(Ok)
    }
}

impl FusedIterator for AgeStream<'_> {}

/// Running sum and count
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct RunningAverage {
    total: f64,
    count: u64,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn finish(self) -> AverageAge {
        if self.count == 0 {
            AverageAge::NoUsers
        } else {
            AverageAge::Mean {
                average: self.total / self.count as f64,
                count: self.count,
            }
        }
    }
}

/// Outcome of [`calculate_average_age`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AverageAge {
    NoUsers,
    Mean { average: f64, count: u64 },
}

impl AverageAge {
    pub fn average(&self) -> Option<f64> {
        match self {
            AverageAge::NoUsers => None,
            AverageAge::Mean { average, .. } => Some(*average),
        }
    }
}

impl fmt::Display for AverageAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageAge::NoUsers => write!(f, "No users found."),
            AverageAge::Mean { average, .. } => write!(f, "Average age of users: {average:.2}"),
        }
    }
}

/// Average every age in `user_data` without materializing the column.
pub fn calculate_average_age(store: &Store) -> Result<AverageAge> {
    let mut running = RunningAverage::new();
    for age in stream_user_ages(store)? {
        running.push(age?);
    }

    let result = running.finish();
    info!(count = running.count(), "average age computed");
    Ok(result)
}
