pub mod block;
pub mod mempool;

pub use block::{Block, BlockBody, OptionKind};
pub use mempool::{Mempool, MempoolError};
