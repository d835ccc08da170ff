//! Storage configuration.

use std::path::PathBuf;

pub const DEFAULT_BLOCK_SIZE: usize = 400;
pub const DEFAULT_LOG_FILE: &str = "wal.log";

/// Where and how blocks and the log are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding every block file and the log file.
    pub data_dir: PathBuf,
    /// Size of every block in bytes. Must match across restarts.
    pub block_size: usize,
    /// Name of the log file inside `data_dir`.
    pub log_file: String,
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StorageConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            data_dir: PathBuf::from("./blocklog_data"),
            block_size: DEFAULT_BLOCK_SIZE,
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
