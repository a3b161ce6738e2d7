//! # pc-05-tx-executor
//!
//! Applies platform transactions to a ledger view.
//!
//! ## Role in System
//!
//! - **Executors**: every executor matches exhaustively on
//!   [`UnsignedTx`](shared_types::UnsignedTx). A kind an executor does not
//!   support is a [`ExecutorError::WrongTxType`] contract violation.
//! - **No partial effects**: each transaction is fully verified before the
//!   first write to the view, so a rejected transaction leaves it untouched.
//! - **Atomic requests**: imports and exports produce shared-memory
//!   [`Requests`](pc_02_shared_memory::Requests) that the block executor
//!   commits together with the ledger writes on acceptance.
//!
//! ## Executors
//!
//! | Executor | Kinds |
//! |----------|-------|
//! | [`StandardTxExecutor`] | every decision kind |
//! | [`ProposalTxExecutor`] | `AdvanceTime`, `RewardValidator` |
//! | [`AtomicTxExecutor`] | `Import`, `Export` |
//! | [`MempoolTxVerifier`] | decision kinds, against a throw-away diff |
//! | [`WarpVerifier`] | every kind, per consensus height |
//!
//! ## Module Structure
//!
//! ```text
//! pc-05-tx-executor/
//! ├── domain/     # flow check, reward curve, staker rules, time advance
//! ├── service/    # the executors
//! ├── adapters/   # SecpFx, shared-memory reader
//! ├── ports.rs    # Fx, ProofOfPossessionVerifier, AtomicUtxos
//! ├── backend.rs  # configuration and collaborators shared by executors
//! ├── config.rs   # staking, reward, fee and upgrade parameters
//! └── errors.rs   # ExecutorError, ErrorKind
//! ```

pub mod adapters;
pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

pub use adapters::SecpFx;
pub use backend::Backend;
pub use config::{
    BootstrapMode, ConfigError, ExecutorConfig, FeeConfig, RewardConfig, StakingConfig,
    UpgradeConfig,
};
pub use domain::{
    advance_time_to, next_staker_change_time, verify_spend, RewardCalculator,
};
pub use errors::{ErrorKind, ExecutorError, FxError};
pub use ports::{AtomicUtxos, Fx, ProofOfPossessionVerifier};
pub use service::{
    AcceptEffect, AtomicTxExecutor, MempoolTxVerifier, ProposalOutcome, ProposalTxExecutor,
    StandardTxExecutor, TxEffects, WarpVerifier,
};
