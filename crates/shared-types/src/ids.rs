//! # Identifiers
//!
//! Fixed-length identifiers used by every subsystem.
//!
//! - `Id` (32 bytes): chains, blocks, transactions, subnets, assets
//! - `NodeId` (20 bytes): validator node identity
//! - `ShortId` (20 bytes): owner addresses

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A 32-byte identifier.
///
/// Ordering is lexicographic over the raw bytes, which is what the
/// shared-memory prefix assignment and the staker tie-break rely on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Id(pub [u8; 32]);

impl Id {
    /// The all-zero ID.
    pub const EMPTY: Id = Id([0u8; 32]);

    /// SHA-256 of `data`.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Id(hasher.finalize().into())
    }

    /// Derives a child ID: `sha256(self || index_be)`.
    pub fn prefixed(&self, index: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hasher.update(index.to_be_bytes());
        Id(hasher.finalize().into())
    }

    /// Builds an ID whose first byte is `b` (test fixtures, genesis constants).
    pub const fn from_byte(b: u8) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = b;
        Id(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for Id {
    fn from(bytes: [u8; 32]) -> Self {
        Id(bytes)
    }
}

/// A validator node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub [u8; 20]);

impl NodeId {
    pub const EMPTY: NodeId = NodeId([0u8; 20]);

    pub const fn from_byte(b: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[0] = b;
        NodeId(bytes)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeID-{}", hex::encode(self.0))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", hex::encode(&self.0[..6]))
    }
}

/// A 20-byte address (output owner).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ShortId(pub [u8; 20]);

impl ShortId {
    pub const fn from_byte(b: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[0] = b;
        ShortId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Debug for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShortId({})", hex::encode(&self.0[..6]))
    }
}

pub type ChainId = Id;
pub type BlockId = Id;
pub type TxId = Id;
pub type SubnetId = Id;
pub type AssetId = Id;

/// The primary network is the subnet every validator must belong to.
pub const PRIMARY_NETWORK_ID: SubnetId = Id::EMPTY;
