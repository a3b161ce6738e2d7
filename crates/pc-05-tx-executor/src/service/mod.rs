mod atomic;
mod effects;
mod mempool;
mod proposal;
mod standard;
mod warp;

#[cfg(test)]
pub(crate) mod fixtures;

pub use atomic::AtomicTxExecutor;
pub use effects::{AcceptEffect, TxEffects};
pub use mempool::MempoolTxVerifier;
pub use proposal::{ProposalOutcome, ProposalTxExecutor};
pub use standard::StandardTxExecutor;
pub use warp::WarpVerifier;
