// Test helpers for running user-stream tests against a file-backed store
//
// This file is included directly in test files using `include!` macro
// to avoid duplicate module issues when multiple test files need the helpers.

use tempfile::TempDir;
use user_stream::{seed, Result, Store, UserRecord};

/// Build `n` users with ids `user-0..n`, names `User i` and ages `20 + i`.
#[allow(dead_code)]
pub fn sample_users(n: usize) -> Vec<UserRecord> {
    (0..n)
        .map(|i| {
            UserRecord::new(
                format!("user-{i}"),
                format!("User {i}"),
                format!("user{i}@example.com"),
                20.0 + i as f64,
            )
        })
        .collect()
}

/// Run a test function against a freshly seeded database file.
///
/// # Arguments
/// * `test_name` - Name of the test for logging
/// * `users` - Rows to insert, in scan order
/// * `test_fn` - The test function to run with the open store
#[allow(dead_code)]
pub fn run_with_users<F>(test_name: &str, users: Vec<UserRecord>, test_fn: F) -> Result<()>
where
    F: FnOnce(&Store) -> Result<()>,
{
    println!("Running {test_name} with {} users", users.len());
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = Store::open(dir.path().join("user_data.db"))?;
    seed::create_table(&store)?;
    seed::insert_users(&mut store, users)?;
    test_fn(&store)?;
    store.close()
}

/// Write `contents` to a CSV file inside `dir` and return its path.
#[allow(dead_code)]
pub fn write_csv(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("user_data.csv");
    std::fs::write(&path, contents).expect("Failed to write CSV");
    path
}
