//! Storage backends for committed collection state.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageConfig, StorageError};
