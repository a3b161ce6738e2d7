//! # pc-04-state-diff
//!
//! Copy-on-write ledger views for candidate blocks.
//!
//! ## Role in System
//!
//! - **Overlay**: a [`Diff`] records one block's mutations and reads
//!   everything else through its parent.
//! - **Arena**: parents are resolved by block ID through [`Versions`], never
//!   held by pointer. [`DiffArena`] answers the last accepted block with the
//!   committed base and every processing block with its frozen diff, so
//!   discarding a rejected block is a map delete.
//! - **Apply**: on acceptance [`Diff::apply`] replays the overlay onto the
//!   committed [`State`](pc_03_staker_ledger::State) in a fixed order.
//!
//! Two diffs built on the same parent never see each other.

pub mod arena;
pub mod diff;
pub mod ports;

pub use arena::DiffArena;
pub use diff::Diff;
pub use ports::Versions;
