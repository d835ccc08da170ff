use crate::config::StorageConfig;
use crate::storage::disk::FileManager;
use crate::storage::wal::LogManager;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Opens the file manager and log of one data directory together
pub struct Database {
    config: StorageConfig,
    file_manager: Arc<FileManager>,
    log_manager: LogManager,
}

impl Database {
    /// Open the data directory described by `config`, creating it if missing
    pub fn open(config: StorageConfig) -> Result<Self> {
        let file_manager = Arc::new(
            FileManager::new(&config.data_dir, config.block_size).with_context(|| {
                format!("Failed to open data directory {:?}", config.data_dir)
            })?,
        );

        let log_manager = LogManager::new(file_manager.clone(), config.log_file.clone())
            .with_context(|| format!("Failed to open log file {}", config.log_file))?;

        Ok(Self {
            config,
            file_manager,
            log_manager,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn file_manager(&self) -> &Arc<FileManager> {
        &self.file_manager
    }

    pub fn log_manager(&self) -> &LogManager {
        &self.log_manager
    }

    /// Whether the data directory was created by this open
    pub fn is_new(&self) -> bool {
        self.file_manager.is_new()
    }

    /// Flush the log and release all file handles
    pub fn close(self) -> Result<()> {
        self.log_manager.flush().context("Failed to flush log")?;
        self.file_manager
            .close()
            .context("Failed to close data files")?;
        Ok(())
    }
}
