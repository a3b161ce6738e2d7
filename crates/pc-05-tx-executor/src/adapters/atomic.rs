use crate::ports::AtomicUtxos;
use pc_02_shared_memory::{SharedMemory, SharedMemoryError};
use shared_types::ChainId;

impl AtomicUtxos for SharedMemory {
    fn get(&self, peer: ChainId, keys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, SharedMemoryError> {
        SharedMemory::get(self, peer, keys)
    }
}
