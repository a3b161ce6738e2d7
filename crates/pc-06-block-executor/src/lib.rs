//! # pc-06-block-executor
//!
//! Verifies, accepts and rejects platform-chain blocks, and builds new ones.
//!
//! ## Role in System
//!
//! - **Verify once**: a block is executed a single time into a diff kept in
//!   the [`DiffArena`](pc_04_state_diff::DiffArena). Verifying it again for
//!   another consensus height only records that height.
//! - **Proposal blocks** carry a commit view and an abort view;
//!   [`BlockManager::options`] orders the two children by this node's
//!   preference.
//! - **Accept** writes the block's ledger changes and its shared-memory
//!   requests in one batch. A failure there is fatal to the node.
//! - **Coarse lock**: every public operation takes a [`ChainGuard`] of the
//!   [`ChainLock`] handed to [`BlockManager::new`].
//!
//! ## Module Structure
//!
//! ```text
//! pc-06-block-executor/
//! ├── domain/     # Block, BlockBody, Mempool
//! ├── service/    # BlockManager, options, builder, ChainLock, timer
//! ├── adapters/   # SystemClock, ManualClock
//! ├── ports.rs    # ChainCreator, Uptime, Clock
//! ├── config.rs   # ManagerConfig
//! ├── metrics.rs  # optional Prometheus metrics
//! └── errors.rs   # BlockError, PreferenceError
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{ManualClock, SystemClock};
pub use config::{ConfigError, ManagerConfig};
pub use domain::{Block, BlockBody, Mempool, MempoolError, OptionKind};
pub use errors::{BlockError, PreferenceError, UptimeError};
pub use ports::{ChainCreator, Clock, Uptime};
pub use service::{
    spawn_maintenance_timer, BlockManager, BlockStatus, ChainGuard, ChainLock, ManagerPorts,
};
