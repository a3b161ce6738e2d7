use crate::domain::MempoolError;
use pc_02_shared_memory::SharedMemoryError;
use pc_03_staker_ledger::LedgerError;
use pc_05_tx_executor::ExecutorError;
use shared_types::{BlockId, CodecError, Id, NodeId, SubnetId, TxId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Block {0} is not tracked")]
    UnknownBlock(BlockId),

    #[error("Parent {parent_id} of block {block_id} is neither processing nor last accepted")]
    ParentNotFound { block_id: BlockId, parent_id: BlockId },

    #[error("Block height {actual}, expected {expected}")]
    WrongHeight { expected: u64, actual: u64 },

    #[error("Block {0} carries no transactions and changes no stakers")]
    EmptyBlock(BlockId),

    #[error("Input {0} consumed twice in one block")]
    ConflictingBlockTxs(Id),

    #[error("Input {input_id} already consumed by processing ancestor {ancestor}")]
    ConflictingParentTxs { input_id: Id, ancestor: BlockId },

    #[error("Apricot block {kind} issued after Banff activation at {timestamp}")]
    ApricotBlockAfterFork { kind: &'static str, timestamp: u64 },

    #[error("Banff block {kind} issued before Banff activation at {timestamp}")]
    BanffBlockBeforeFork { kind: &'static str, timestamp: u64 },

    #[error("Block time {proposed} precedes parent time {parent}")]
    TimestampBeforeParent { proposed: u64, parent: u64 },

    #[error("Block time {proposed} is past local bound {bound}")]
    TimestampTooFar { proposed: u64, bound: u64 },

    #[error("Block time {proposed} skips staker change at {next_change}")]
    TimestampBeyondStakerChange { proposed: u64, next_change: u64 },

    #[error("Option block time {actual} differs from proposal time {expected}")]
    OptionTimestampMismatch { expected: u64, actual: u64 },

    #[error("Parent {0} of an option block is not a proposal block")]
    NotProposalBlock(BlockId),

    #[error("Child {0} of a proposal block must be a commit or abort block")]
    ExpectedOption(BlockId),

    #[error("Block {block_id} does not extend last accepted {last_accepted}")]
    NotChildOfLastAccepted {
        block_id: BlockId,
        last_accepted: BlockId,
    },

    #[error("Guard belongs to a different chain lock")]
    ForeignLock,

    #[error("Nothing to build on top of {0}")]
    NoBlockToBuild(BlockId),

    #[error("Transaction {tx_id} failed: {source}")]
    Tx {
        tx_id: TxId,
        #[source]
        source: ExecutorError,
    },

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Mempool error: {0}")]
    Mempool(#[from] MempoolError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Shared memory error: {0}")]
    SharedMemory(#[from] SharedMemoryError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl BlockError {
    pub fn tx(tx_id: TxId, source: ExecutorError) -> Self {
        BlockError::Tx { tx_id, source }
    }

    /// Whether the committed ledger may no longer match the accepted
    /// history. Only storage writes during acceptance produce these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BlockError::Ledger(_) | BlockError::SharedMemory(_))
    }
}

/// Why a commit preference could not be computed.
///
/// Never fatal: the caller falls back to preferring commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    #[error("Staker transaction {tx_id} unavailable: {source}")]
    StakerTx {
        tx_id: TxId,
        #[source]
        source: LedgerError,
    },

    #[error("Transaction {0} is not a staker transaction")]
    NotStaker(TxId),

    #[error("Node {0} is not a primary network validator")]
    PrimaryValidator(NodeId),

    #[error("Staking rules of subnet {subnet_id} unavailable: {source}")]
    Rules {
        subnet_id: SubnetId,
        #[source]
        source: ExecutorError,
    },

    #[error("Uptime of {node_id} unavailable: {source}")]
    Uptime {
        node_id: NodeId,
        #[source]
        source: UptimeError,
    },

    #[error("Proposal state of {0} is not tracked")]
    MissingState(BlockId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UptimeError {
    #[error("Node {0} is not tracked")]
    NotTracked(NodeId),

    #[error("Start time {start} is after now {now}")]
    StartInFuture { start: u64, now: u64 },
}
