mod memory;
mod shared_memory;
mod state;

pub use memory::Memory;
pub use shared_memory::{IndexedPage, SharedMemory};
