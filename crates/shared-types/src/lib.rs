//! # Shared Types Crate
//!
//! Types every platform-chain subsystem agrees on.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identifiers, the UTXO model and the
//!   transaction sum type are defined once, here.
//! - **Explicit codec**: there is no global codec registry. A [`Codec`] is
//!   built once at start-up and handed to whoever needs to (de)serialize.

pub mod avax;
pub mod codec;
pub mod errors;
pub mod ids;
pub mod txs;

pub use avax::*;
pub use codec::{Codec, CODEC_VERSION};
pub use errors::*;
pub use ids::*;
pub use txs::*;
