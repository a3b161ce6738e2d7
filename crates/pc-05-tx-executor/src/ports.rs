//! # Executor Ports
//!
//! Cryptography and cross-chain reads the executor consumes but does not
//! implement.

use crate::errors::FxError;
use pc_02_shared_memory::SharedMemoryError;
use shared_types::{ChainId, Credential, OutputOwners, ProofOfPossession};

/// Spend authorization for one input.
pub trait Fx: Send + Sync {
    /// Checks that `credential` authorises spending an output owned by
    /// `owners` at chain time `now`, using the signature slots
    /// `sig_indices`.
    fn verify_permission(
        &self,
        owners: &OutputOwners,
        sig_indices: &[u32],
        credential: &Credential,
        now: u64,
    ) -> Result<(), FxError>;
}

/// BLS proof-of-possession check for validator keys.
pub trait ProofOfPossessionVerifier: Send + Sync {
    fn verify(&self, pop: &ProofOfPossession) -> bool;
}

/// Reads UTXOs exported to this chain by `peer`.
pub trait AtomicUtxos: Send + Sync {
    /// One value per key, in order. A missing key is an error.
    fn get(&self, peer: ChainId, keys: &[Vec<u8>]) -> Result<Vec<Vec<u8>>, SharedMemoryError>;
}
