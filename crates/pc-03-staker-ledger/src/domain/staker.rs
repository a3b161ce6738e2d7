use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use shared_types::{BlsPublicKey, NodeId, Priority, StakerTxInfo, SubnetId, TxId};
use std::cmp::Ordering;

/// One validator or delegator instance.
///
/// `next_time` is `start_time` while pending and `end_time` once current.
/// Ordering is `(next_time, priority, tx_id)`; the tx ID makes it strict.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staker {
    pub tx_id: TxId,
    pub node_id: NodeId,
    #[serde_as(as = "Option<Bytes>")]
    pub public_key: Option<BlsPublicKey>,
    pub subnet_id: SubnetId,
    pub weight: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub potential_reward: u64,
    pub next_time: u64,
    pub priority: Priority,
}

impl Staker {
    pub fn new_pending(tx_id: TxId, info: &StakerTxInfo) -> Self {
        Self {
            tx_id,
            node_id: info.node_id,
            public_key: info.public_key,
            subnet_id: info.subnet_id,
            weight: info.weight,
            start_time: info.start_time,
            end_time: info.end_time,
            potential_reward: 0,
            next_time: info.start_time,
            priority: info.pending_priority,
        }
    }

    /// Current staker starting at `start_time`. Stakers added directly to the
    /// current set start at chain time rather than their declared start.
    pub fn new_current(
        tx_id: TxId,
        info: &StakerTxInfo,
        start_time: u64,
        potential_reward: u64,
    ) -> Self {
        Self {
            tx_id,
            node_id: info.node_id,
            public_key: info.public_key,
            subnet_id: info.subnet_id,
            weight: info.weight,
            start_time,
            end_time: info.end_time,
            potential_reward,
            next_time: info.end_time,
            priority: info.current_priority,
        }
    }

    /// The current-set version of a pending staker.
    pub fn promote(&self, potential_reward: u64) -> Self {
        Self {
            potential_reward,
            next_time: self.end_time,
            priority: self.priority.as_current(),
            ..self.clone()
        }
    }

    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }

    pub fn is_validator(&self) -> bool {
        self.priority.is_validator()
    }
}

impl Ord for Staker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.next_time
            .cmp(&other.next_time)
            .then(self.priority.cmp(&other.priority))
            .then(self.tx_id.cmp(&other.tx_id))
    }
}

impl PartialOrd for Staker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
