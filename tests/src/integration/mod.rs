//! Cross-crate scenarios, one module per flow.

pub mod atomic_flow;
pub mod ledger_history;
pub mod staking_flow;
