use super::SharedMemory;
use pc_01_keyed_store::{KeyedStore, PrefixStore};
use parking_lot::Mutex;
use shared_types::{ChainId, Codec, Id};
use std::collections::HashMap;
use std::sync::Arc;

struct RcLock {
    lock: Arc<Mutex<()>>,
    count: usize,
}

/// Node-wide owner of the shared-memory store.
///
/// Holds one lock per chain pair (keyed by shared ID). Locks are created on
/// demand and dropped when the last holder releases them.
pub struct Memory {
    store: Arc<dyn KeyedStore>,
    codec: Arc<Codec>,
    locks: Mutex<HashMap<Id, RcLock>>,
}

impl Memory {
    pub fn new(store: Arc<dyn KeyedStore>, codec: Arc<Codec>) -> Arc<Self> {
        Arc::new(Self {
            store,
            codec,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Handle for `chain_id`'s side of every pair it participates in.
    pub fn new_shared_memory(self: &Arc<Self>, chain_id: ChainId) -> SharedMemory {
        SharedMemory::new(chain_id, self.clone())
    }

    pub fn store(&self) -> &Arc<dyn KeyedStore> {
        &self.store
    }

    pub(crate) fn codec(&self) -> &Codec {
        &self.codec
    }

    pub(crate) fn make_lock(&self, shared_id: Id) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        let entry = locks.entry(shared_id).or_insert_with(|| RcLock {
            lock: Arc::new(Mutex::new(())),
            count: 0,
        });
        entry.count += 1;
        entry.lock.clone()
    }

    pub(crate) fn release_lock(&self, shared_id: Id) {
        let mut locks = self.locks.lock();
        if let Some(entry) = locks.get_mut(&shared_id) {
            entry.count -= 1;
            if entry.count == 0 {
                locks.remove(&shared_id);
            }
        }
    }

    /// Keyspace of one chain pair over `db`.
    pub(crate) fn shared_db(db: Arc<dyn KeyedStore>, shared_id: Id) -> PrefixStore {
        PrefixStore::new(shared_id.as_bytes(), db)
    }

    #[cfg(test)]
    pub(crate) fn live_locks(&self) -> usize {
        self.locks.lock().len()
    }
}
