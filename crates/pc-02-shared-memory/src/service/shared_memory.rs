use super::state::NamespaceState;
use super::Memory;
use crate::domain::{inbound, outbound, shared_id, Requests};
use crate::errors::SharedMemoryError;
use pc_01_keyed_store::{Batch, KeyedStore, VersionStore};
use parking_lot::Mutex;
use shared_types::{ChainId, Id};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// One page of a trait-indexed lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexedPage {
    pub values: Vec<Vec<u8>>,
    pub last_trait: Vec<u8>,
    pub last_key: Vec<u8>,
}

/// A chain's view of shared memory.
#[derive(Clone)]
pub struct SharedMemory {
    chain_id: ChainId,
    memory: Arc<Memory>,
}

impl SharedMemory {
    pub(crate) fn new(chain_id: ChainId, memory: Arc<Memory>) -> Self {
        Self { chain_id, memory }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    fn check_peer(&self, peer: ChainId) -> Result<(), SharedMemoryError> {
        if peer == self.chain_id {
            return Err(SharedMemoryError::SameChain { chain: peer });
        }
        Ok(())
    }

    fn with_lock<T>(
        &self,
        peer: ChainId,
        f: impl FnOnce(Id) -> Result<T, SharedMemoryError>,
    ) -> Result<T, SharedMemoryError> {
        let sid = shared_id(self.chain_id, peer);
        let lock = self.memory.make_lock(sid);
        let result = {
            let _guard = lock.lock();
            f(sid)
        };
        self.memory.release_lock(sid);
        result
    }

    /// Values the peer delivered under `keys`, in order.
    pub fn get(&self, peer: ChainId, keys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, SharedMemoryError> {
        self.check_peer(peer)?;
        self.with_lock(peer, |sid| {
            let db = Memory::shared_db(self.memory.store().clone(), sid);
            let state = NamespaceState::open(&db, inbound(self.chain_id, peer), self.memory.codec());
            keys.iter().map(|k| state.value(k)).collect()
        })
    }

    /// Values the peer delivered carrying any of `traits`, paged.
    pub fn get_indexed(
        &self,
        peer: ChainId,
        traits: &[Vec<u8>],
        start_trait: &[u8],
        start_key: &[u8],
        limit: usize,
    ) -> Result<IndexedPage, SharedMemoryError> {
        self.check_peer(peer)?;
        self.with_lock(peer, |sid| {
            let db = Memory::shared_db(self.memory.store().clone(), sid);
            let state = NamespaceState::open(&db, inbound(self.chain_id, peer), self.memory.codec());
            let (keys, last_trait, last_key) =
                state.keys_by_traits(traits, start_trait, start_key, limit)?;
            let values = keys
                .iter()
                .map(|k| state.value(k))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(IndexedPage {
                values,
                last_trait,
                last_key,
            })
        })
    }

    /// Applies `requests` for every peer together with `batches` in one
    /// write. On any error nothing is written.
    ///
    /// `batches` must target the same physical store as this memory.
    pub fn apply(
        &self,
        requests: &BTreeMap<ChainId, Requests>,
        batches: Vec<Batch>,
    ) -> Result<(), SharedMemoryError> {
        for peer in requests.keys() {
            self.check_peer(*peer)?;
        }

        // Lock order is the shared ID order, identical for every caller.
        let mut pairs: Vec<(Id, ChainId, &Requests)> = requests
            .iter()
            .map(|(peer, req)| (shared_id(self.chain_id, *peer), *peer, req))
            .collect();
        pairs.sort_by_key(|(sid, _, _)| *sid);

        let locks: Vec<(Id, Arc<Mutex<()>>)> = pairs
            .iter()
            .map(|(sid, _, _)| (*sid, self.memory.make_lock(*sid)))
            .collect();
        let result = {
            let _guards: Vec<_> = locks.iter().map(|(_, l)| l.lock()).collect();
            self.apply_locked(&pairs, batches)
        };
        for (sid, _) in &locks {
            self.memory.release_lock(*sid);
        }
        result
    }

    fn apply_locked(
        &self,
        pairs: &[(Id, ChainId, &Requests)],
        batches: Vec<Batch>,
    ) -> Result<(), SharedMemoryError> {
        let version = Arc::new(VersionStore::new(self.memory.store().clone()));
        let mut puts = 0usize;
        let mut removes = 0usize;

        for (sid, peer, req) in pairs {
            let db = Memory::shared_db(version.clone(), *sid);
            let codec = self.memory.codec();

            let consumed = NamespaceState::open(&db, inbound(self.chain_id, *peer), codec);
            for key in &req.remove_requests {
                consumed.remove_value(key)?;
            }
            removes += req.remove_requests.len();

            let delivered = NamespaceState::open(&db, outbound(self.chain_id, *peer), codec);
            for element in &req.put_requests {
                delivered.set_value(element)?;
            }
            puts += req.put_requests.len();
        }

        let mut batch = version.commit_batch();
        for extra in batches {
            batch.extend(extra);
        }
        debug!(
            chain = %self.chain_id,
            peers = pairs.len(),
            puts,
            removes,
            ops = batch.len(),
            "applying shared memory requests"
        );
        self.memory.store().write_batch(batch)?;
        Ok(())
    }
}
