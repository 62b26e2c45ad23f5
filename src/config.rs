use crate::batch_stream::{DEFAULT_BATCH_SIZE, DEFAULT_MIN_AGE};
use crate::error::{Error, Result};
use crate::name_map::NameMap;
use crate::paginate::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database holding `user_data`
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Rows per batch for the batch filter
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,

    /// Users strictly older than this pass the batch filter
    #[serde(default = "default_min_age")]
    pub min_age: f64,

    /// Rows per page for lazy pagination
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Fallback tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Names replaced by the row streamer
    #[serde(default)]
    pub name_map: NameMap,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("user_data.db")
}

fn default_batch_size() -> i64 {
    DEFAULT_BATCH_SIZE
}

fn default_min_age() -> f64 {
    DEFAULT_MIN_AGE
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            batch_size: default_batch_size(),
            min_age: default_min_age(),
            page_size: default_page_size(),
            log_level: default_log_level(),
            name_map: NameMap::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size <= 0 {
            return Err(Error::Config(format!(
                "batch_size must be greater than 0, got {}",
                self.batch_size
            )));
        }
        if self.page_size <= 0 {
            return Err(Error::Config(format!(
                "page_size must be greater than 0, got {}",
                self.page_size
            )));
        }
        if !self.min_age.is_finite() {
            return Err(Error::Config("min_age must be a finite number".to_string()));
        }
        Ok(())
    }
}
