mod builder;
mod lock;
mod manager;
mod options;
mod timer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use lock::{ChainGuard, ChainLock};
pub use manager::{BlockManager, BlockStatus, ManagerPorts};
pub use timer::spawn_maintenance_timer;
