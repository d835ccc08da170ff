pub mod file_manager;

pub use file_manager::{FileManager, MIN_BLOCK_SIZE};
