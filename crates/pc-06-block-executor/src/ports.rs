//! # Block Executor Ports
//!
//! Collaborators the manager calls out to: chain creation after a
//! `CreateChain` is accepted, uptime tracking for reward preference, and
//! wall-clock time.

use crate::errors::UptimeError;
use shared_types::{ChainId, NodeId, SubnetId, Tx};

/// Starts chains once the transaction creating them is accepted.
pub trait ChainCreator: Send + Sync {
    fn queue_chain_creation(&self, chain_id: ChainId, subnet_id: SubnetId, tx: &Tx);
}

/// Observed uptime of validators.
pub trait Uptime: Send + Sync {
    /// Fraction of time in `[0, 1]` that `node_id` was connected since
    /// `start_time`, as seen by this node.
    fn calculate_uptime_percent_from(
        &self,
        node_id: NodeId,
        subnet_id: SubnetId,
        start_time: u64,
    ) -> Result<f64, UptimeError>;
}

/// Local wall-clock time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}
