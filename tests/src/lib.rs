//! # Platform-Chain Test Suite
//!
//! End-to-end scenarios that drive the block manager over a real ledger,
//! diff arena and shared memory, all on one store.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Network: genesis ledger + manager + tx helpers
//! └── integration/
//!     ├── atomic_flow.rs     # exports and imports across chains
//!     ├── staking_flow.rs    # validators, rewards and uptime preference
//!     └── ledger_history.rs  # validator-set history, restart, diff isolation
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p pc-tests
//! cargo test -p pc-tests integration::staking_flow
//!
//! # Benchmarks
//! cargo bench -p pc-tests
//! ```

pub mod fixtures;
pub mod integration;
