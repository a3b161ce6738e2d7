use pc_02_shared_memory::Requests;
use shared_types::{ChainId, Id, SubnetId, Tx};
use std::collections::{BTreeMap, BTreeSet};

/// Work deferred until the block carrying the transaction is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptEffect {
    /// Start the chain described by a `CreateChain` transaction.
    CreateChain {
        chain_id: ChainId,
        subnet_id: SubnetId,
        tx: Tx,
    },
}

/// What executing a decision transaction produced besides ledger writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxEffects {
    /// Input IDs consumed, local and imported.
    pub inputs: BTreeSet<Id>,
    /// Shared-memory requests per peer chain.
    pub atomic_requests: BTreeMap<ChainId, Requests>,
    pub on_accept: Vec<AcceptEffect>,
}

impl TxEffects {
    /// Folds the effects of a later transaction of the same block into this.
    pub fn merge(&mut self, other: TxEffects) {
        self.inputs.extend(other.inputs);
        for (chain_id, requests) in other.atomic_requests {
            self.atomic_requests.entry(chain_id).or_default().merge(requests);
        }
        self.on_accept.extend(other.on_accept);
    }
}
