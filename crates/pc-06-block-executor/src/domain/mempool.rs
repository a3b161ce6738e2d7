//! # Mempool
//!
//! Decision transactions waiting for a block. Insertion order is kept so
//! blocks pick transactions first-come first-served. Two pooled
//! transactions never consume the same input.
//!
//! Transactions that failed verification are remembered in a bounded LRU
//! with the failure reason, so a re-gossiped bad transaction is rejected
//! without being executed again.

use lru::LruCache;
use shared_types::{Id, Tx, TxId, UnsignedTx};
use std::collections::{HashMap, HashSet, VecDeque};
use std::num::NonZeroUsize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("Transaction {0} is already pooled")]
    Duplicate(TxId),

    #[error("Mempool full ({capacity} transactions)")]
    Full { capacity: usize },

    #[error("Transaction {tx_id} spends input {input_id} already spent by {pooled}")]
    ConflictingInput {
        tx_id: TxId,
        input_id: Id,
        pooled: TxId,
    },

    #[error("Transaction {tx_id} was dropped: {reason}")]
    Dropped { tx_id: TxId, reason: String },

    #[error("Proposal transaction {0} cannot be pooled")]
    ProposalTx(&'static str),
}

pub struct Mempool {
    capacity: usize,
    txs: HashMap<TxId, Tx>,
    order: VecDeque<TxId>,
    consumed: HashMap<Id, TxId>,
    dropped: LruCache<TxId, String>,
}

impl Mempool {
    pub fn new(capacity: usize, dropped_cache_size: NonZeroUsize) -> Self {
        Self {
            capacity,
            txs: HashMap::new(),
            order: VecDeque::new(),
            consumed: HashMap::new(),
            dropped: LruCache::new(dropped_cache_size),
        }
    }

    pub fn add(&mut self, tx: Tx) -> Result<(), MempoolError> {
        let tx_id = tx.id();
        match tx.unsigned() {
            UnsignedTx::AdvanceTime(_) | UnsignedTx::RewardValidator(_) => {
                return Err(MempoolError::ProposalTx(tx.unsigned().name()))
            }
            _ => {}
        }
        if self.txs.contains_key(&tx_id) {
            return Err(MempoolError::Duplicate(tx_id));
        }
        if let Some(reason) = self.dropped.peek(&tx_id) {
            return Err(MempoolError::Dropped {
                tx_id,
                reason: reason.clone(),
            });
        }
        if self.txs.len() >= self.capacity {
            return Err(MempoolError::Full {
                capacity: self.capacity,
            });
        }
        let inputs = tx.unsigned().input_ids();
        if let Some((input_id, pooled)) = inputs
            .iter()
            .find_map(|id| self.consumed.get(id).map(|owner| (*id, *owner)))
        {
            return Err(MempoolError::ConflictingInput {
                tx_id,
                input_id,
                pooled,
            });
        }

        for input_id in inputs {
            self.consumed.insert(input_id, tx_id);
        }
        self.order.push_back(tx_id);
        self.txs.insert(tx_id, tx);
        Ok(())
    }

    /// Re-inserts transactions of a rejected block. Ones that no longer fit
    /// are skipped.
    pub fn requeue(&mut self, txs: impl IntoIterator<Item = Tx>) -> usize {
        txs.into_iter().filter(|tx| self.add(tx.clone()).is_ok()).count()
    }

    pub fn remove(&mut self, tx_id: &TxId) -> Option<Tx> {
        let tx = self.txs.remove(tx_id)?;
        self.order.retain(|id| id != tx_id);
        for input_id in tx.unsigned().input_ids() {
            if self.consumed.get(&input_id) == Some(tx_id) {
                self.consumed.remove(&input_id);
            }
        }
        Some(tx)
    }

    /// Up to `max` transactions in arrival order, left in the pool.
    pub fn peek(&self, max: usize) -> Vec<Tx> {
        self.iter().take(max).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tx> {
        self.order.iter().filter_map(|id| self.txs.get(id))
    }

    /// Removes the transaction and remembers why it was dropped.
    pub fn mark_dropped(&mut self, tx_id: TxId, reason: impl Into<String>) {
        self.remove(&tx_id);
        self.dropped.put(tx_id, reason.into());
    }

    pub fn dropped_reason(&self, tx_id: &TxId) -> Option<&str> {
        self.dropped.peek(tx_id).map(String::as_str)
    }

    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.txs.contains_key(tx_id)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}
