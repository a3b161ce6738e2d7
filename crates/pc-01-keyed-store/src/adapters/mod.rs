mod memory;
mod prefix;
mod version;

#[cfg(feature = "rocksdb")]
mod rocks;

pub use memory::MemoryStore;
pub use prefix::PrefixStore;
pub use version::VersionStore;

#[cfg(feature = "rocksdb")]
pub use rocks::{RocksDbConfig, RocksDbStore};
