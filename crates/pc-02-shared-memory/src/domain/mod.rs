//! # Shared Memory Domain
//!
//! Records exchanged between chains and the deterministic namespace
//! assignment for a chain pair.

use serde::{Deserialize, Serialize};
use shared_types::{ChainId, Id};

/// One cross-chain record. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Index keys (typically owner addresses) for lookups by attribute.
    pub traits: Vec<Vec<u8>>,
}

/// Everything one block asks of a single peer chain.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Requests {
    /// Keys consumed from the inbound namespace.
    pub remove_requests: Vec<Vec<u8>>,
    /// Elements delivered to the peer.
    pub put_requests: Vec<Element>,
}

impl Requests {
    pub fn is_empty(&self) -> bool {
        self.remove_requests.is_empty() && self.put_requests.is_empty()
    }

    /// Appends another request set for the same peer.
    pub fn merge(&mut self, other: Requests) {
        self.remove_requests.extend(other.remove_requests);
        self.put_requests.extend(other.put_requests);
    }
}

/// Stored form of an element. `present == false` is a tombstone: the remove
/// arrived before the matching put.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DbElement {
    pub present: bool,
    pub value: Vec<u8>,
    pub traits: Vec<Vec<u8>>,
}

pub(crate) const SMALLER_VALUE_PREFIX: u8 = 0;
pub(crate) const SMALLER_INDEX_PREFIX: u8 = 1;
pub(crate) const LARGER_VALUE_PREFIX: u8 = 2;
pub(crate) const LARGER_INDEX_PREFIX: u8 = 3;

/// Keyspace shared by two chains: `sha256(min || max)`.
pub fn shared_id(a: ChainId, b: ChainId) -> Id {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_bytes());
    buf[32..].copy_from_slice(hi.as_bytes());
    Id::hash(&buf)
}

/// `(value, index)` prefixes `caller` reads and removes from.
pub(crate) fn inbound(caller: ChainId, peer: ChainId) -> (u8, u8) {
    if caller < peer {
        (SMALLER_VALUE_PREFIX, SMALLER_INDEX_PREFIX)
    } else {
        (LARGER_VALUE_PREFIX, LARGER_INDEX_PREFIX)
    }
}

/// `(value, index)` prefixes `caller` writes to.
pub(crate) fn outbound(caller: ChainId, peer: ChainId) -> (u8, u8) {
    inbound(peer, caller)
}
