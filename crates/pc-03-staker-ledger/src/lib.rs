//! # pc-03-staker-ledger
//!
//! Validator and delegator bookkeeping for the platform chain, plus the
//! committed base state every candidate block's diff reads through to.
//!
//! ## Role in System
//!
//! - **Staker order**: stakers are totally ordered by
//!   `(next_time, priority, tx_id)`; two nodes applying the same
//!   transactions always iterate stakers identically.
//! - **Pending / current**: pending stakers do not carry voting weight yet.
//!   Current stakers do, until they are rewarded or expire.
//! - **Weight diffs**: every accepted height records the net weight change
//!   per `(subnet, node)`, so historical validator sets are rebuilt by
//!   replaying changes instead of rescanning state.
//!
//! ## Module Structure
//!
//! ```text
//! pc-03-staker-ledger/
//! ├── domain/     # Staker, BaseStakers, DiffStakers, ValidatorWeightDiff
//! ├── ports.rs    # ChainReader / Chain
//! ├── state/      # State (committed base), SharedState
//! └── errors.rs   # LedgerError
//! ```

pub mod domain;
pub mod errors;
pub mod ports;
pub mod state;

pub use domain::*;
pub use errors::LedgerError;
pub use ports::{Chain, ChainReader};
pub use state::{Genesis, GenesisStaker, SharedState, State, StateConfig};
