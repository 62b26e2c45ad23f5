//! # user-stream
//!
//! Lazy, constant-memory processing of the `user_data` table.
//!
//! Every pipeline borrows an open [`Store`] and pulls rows through a keyset
//! cursor, so no pipeline ever holds more than one fetch worth of rows:
//!
//! - [`stream_users`] yields one record at a time with names remapped through a
//!   [`NameMap`]
//! - [`stream_users_in_batches`] yields fixed-size batches, consumed by
//!   [`batch_processing`] to keep users above an age threshold
//! - [`stream_user_ages`] yields the age column, consumed by
//!   [`calculate_average_age`] with a running sum and count
//! - [`lazy_paginate`] yields `LIMIT`/`OFFSET` pages
//!
//! ```
//! use user_stream::{calculate_average_age, seed, Store, UserRecord};
//!
//! let mut store = Store::open_in_memory()?;
//! seed::create_table(&store)?;
//! seed::insert_users(
//!     &mut store,
//!     [
//!         UserRecord::new("1", "Ann", "ann@example.com", 20.0),
//!         UserRecord::new("2", "Bo", "bo@example.com", 30.0),
//!         UserRecord::new("3", "Cy", "cy@example.com", 40.0),
//!     ],
//! )?;
//!
//! let average = calculate_average_age(&store)?;
//! assert_eq!(average.to_string(), "Average age of users: 30.00");
//! store.close()?;
//! # Ok::<(), user_stream::Error>(())
//! ```

mod age_stream;
mod batch_stream;
mod config;
mod error;
mod name_map;
mod paginate;
mod record;
mod row_stream;
pub mod seed;
mod store;

pub use age_stream::{calculate_average_age, stream_user_ages, AgeStream, AverageAge, RunningAverage};
pub use batch_stream::{
    batch_processing, stream_users_in_batches, validate_batch_size, BatchStream,
    DEFAULT_BATCH_SIZE, DEFAULT_MIN_AGE,
};
pub use config::Config;
pub use error::{Error, Result};
pub use name_map::NameMap;
pub use paginate::{lazy_paginate, paginate_users, LazyPaginator, DEFAULT_PAGE_SIZE};
pub use record::{UserRecord, USER_TABLE};
pub use row_stream::{stream_users, UserStream, DEFAULT_FETCH_SIZE};
pub use store::{Cursor, ScanRow, Store};
