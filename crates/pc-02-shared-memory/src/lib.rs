//! # pc-02-shared-memory
//!
//! Atomic cross-chain hand-off of value-bearing records.
//!
//! **Architecture:** Hexagonal (domain / service over the `KeyedStore` port)
//!
//! ## Purpose
//!
//! Two chains exchange [`Element`]s without a commit coordinator. Every chain
//! pair shares one keyspace of the node's single physical store, split into
//! four namespaces:
//!
//! | Prefix | Namespace |
//! |--------|-----------|
//! | 0 | smaller chain value |
//! | 1 | smaller chain index |
//! | 2 | larger chain value |
//! | 3 | larger chain index |
//!
//! A chain reads and removes only from its *inbound* pair and writes only
//! to its *outbound* pair, which is the peer's inbound pair. Because all
//! namespaces are prefixes of the same store, [`SharedMemory::apply`] commits
//! the puts, the removes and the caller's own ledger batch in one write.
//!
//! ## Module Structure
//!
//! ```text
//! pc-02-shared-memory/
//! ├── domain/     # Element, Requests, shared IDs, namespace assignment
//! ├── errors.rs   # SharedMemoryError
//! └── service/    # Memory (store + locks), SharedMemory (per chain), state
//! ```

pub mod domain;
pub mod errors;
pub mod service;

pub use domain::{shared_id, Element, Requests};
pub use errors::SharedMemoryError;
pub use service::{IndexedPage, Memory, SharedMemory};
