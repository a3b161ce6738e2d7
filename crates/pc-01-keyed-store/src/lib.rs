//! # pc-01-keyed-store
//!
//! Ordered key/value storage consumed by the platform-chain ledger and the
//! cross-chain shared memory.
//!
//! ## Role in System
//!
//! - **Port**: [`KeyedStore`] is the only storage contract the ledger core
//!   depends on: point reads, ordered prefix scans and an atomic batch write.
//! - **Prefix views**: [`PrefixStore`] carves independent keyspaces out of one
//!   physical store. Ledger tables and the shared-memory namespaces all live
//!   under prefixes of the same instance, so one batch can touch all of them.
//! - **Versioned overlay**: [`VersionStore`] buffers writes in memory and
//!   hands them back as a single [`Batch`] instead of committing them.
//!
//! ## Adapters
//!
//! | Adapter | Use |
//! |---------|-----|
//! | [`MemoryStore`] | tests, with write-failure injection |
//! | `RocksDbStore` | production (feature `rocksdb`) |

pub mod adapters;
pub mod errors;
pub mod ports;

pub use adapters::*;
pub use errors::DbError;
pub use ports::{Batch, BatchOperation, KeyedStore};
