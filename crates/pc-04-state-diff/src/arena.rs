use crate::diff::Diff;
use crate::ports::Versions;
use parking_lot::RwLock;
use pc_03_staker_ledger::{ChainReader, SharedState};
use shared_types::BlockId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Frozen diffs of processing blocks, keyed by block ID.
///
/// The last accepted block resolves to the committed base. The map lock is
/// held for one lookup or update at a time.
pub struct DiffArena {
    base: SharedState,
    last_accepted: RwLock<BlockId>,
    diffs: RwLock<HashMap<BlockId, Arc<Diff>>>,
}

impl DiffArena {
    pub fn new(base: SharedState, last_accepted: BlockId) -> Self {
        Self {
            base,
            last_accepted: RwLock::new(last_accepted),
            diffs: RwLock::new(HashMap::new()),
        }
    }

    pub fn base(&self) -> &SharedState {
        &self.base
    }

    pub fn last_accepted(&self) -> BlockId {
        *self.last_accepted.read()
    }

    pub fn set_last_accepted(&self, block_id: BlockId) {
        *self.last_accepted.write() = block_id;
    }

    pub fn insert(&self, block_id: BlockId, diff: Arc<Diff>) {
        trace!(block = %block_id, parent = %diff.parent_id(), "tracking diff");
        self.diffs.write().insert(block_id, diff);
    }

    pub fn get(&self, block_id: BlockId) -> Option<Arc<Diff>> {
        self.diffs.read().get(&block_id).cloned()
    }

    pub fn remove(&self, block_id: BlockId) -> Option<Arc<Diff>> {
        self.diffs.write().remove(&block_id)
    }

    pub fn contains(&self, block_id: BlockId) -> bool {
        self.diffs.read().contains_key(&block_id)
    }

    pub fn len(&self) -> usize {
        self.diffs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.read().is_empty()
    }
}

impl Versions for DiffArena {
    fn get_state(&self, block_id: BlockId) -> Option<Arc<dyn ChainReader>> {
        if let Some(diff) = self.get(block_id) {
            return Some(diff);
        }
        if block_id == self.last_accepted() {
            return Some(Arc::new(self.base.clone()));
        }
        None
    }
}
