use pc_02_shared_memory::SharedMemoryError;
use pc_03_staker_ledger::LedgerError;
use shared_types::{AssetId, ChainId, CodecError, Id, NodeId, SubnetId, SyntaxError, TxId};
use thiserror::Error;

/// Credential check failures raised by an [`Fx`](crate::Fx).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    #[error("Output locked until {locktime}, chain time is {now}")]
    Locked { locktime: u64, now: u64 },

    #[error("Expected {expected} signatures, got {actual}")]
    WrongSignatureCount { expected: usize, actual: usize },

    #[error("Credential carries {signers} signers for {indices} signature indices")]
    SignerCountMismatch { signers: usize, indices: usize },

    #[error("Signature index {index} out of bounds ({addresses} addresses)")]
    IndexOutOfBounds { index: u32, addresses: usize },

    #[error("Signature {position} was not produced by the owner at that index")]
    WrongSigner { position: usize },
}

/// How an executor error should be handled by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before any state was touched.
    Malformed,
    /// Economic or authorization failure. The transaction is dropped.
    Rejected,
    /// Local state does not match what the block assumes.
    Referential,
    /// Storage or decoding failure of committed data.
    Storage,
    /// A transaction routed to an executor that does not handle it.
    Contract,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    #[error("Malformed transaction: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("{tx} transactions are not handled by the {executor} executor")]
    WrongTxType {
        executor: &'static str,
        tx: &'static str,
    },

    #[error("Insufficient funds of asset {asset_id}: consumed {consumed}, need {produced}")]
    InsufficientFunds {
        asset_id: AssetId,
        consumed: u64,
        produced: u64,
    },

    #[error("Input {input_id} declares asset {declared} but spends {actual}")]
    AssetMismatch {
        input_id: Id,
        declared: AssetId,
        actual: AssetId,
    },

    #[error("Input {input_id} declares {declared} but the UTXO holds {actual}")]
    AmountMismatch {
        input_id: Id,
        declared: u64,
        actual: u64,
    },

    #[error("Input {input_id} stakeable locktime does not match the UTXO")]
    LocktimeMismatch { input_id: Id },

    #[error("Wrong stake asset: expected {expected}, got {actual}")]
    WrongStakeAsset { expected: AssetId, actual: AssetId },

    #[error("Expected {expected} credentials, got {actual}")]
    CredentialCount { expected: usize, actual: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] FxError),

    #[error("Amount overflow")]
    Overflow,

    #[error("Weight {weight} below minimum {min}")]
    WeightTooSmall { weight: u64, min: u64 },

    #[error("Weight {weight} above maximum {max}")]
    WeightTooLarge { weight: u64, max: u64 },

    #[error("Staking duration {duration}s below minimum {min}s")]
    DurationTooShort { duration: u64, min: u64 },

    #[error("Staking duration {duration}s above maximum {max}s")]
    DurationTooLong { duration: u64, max: u64 },

    #[error("Staking start {start} is not after chain time {now}")]
    StartNotInFuture { start: u64, now: u64 },

    #[error("Staking start {start} is beyond {max}")]
    StartTooFar { start: u64, max: u64 },

    #[error("Delegation fee {shares} below minimum {min}")]
    DelegationFeeTooLow { shares: u32, min: u32 },

    #[error("Node {node_id} already validates subnet {subnet_id}")]
    DuplicateValidator { subnet_id: SubnetId, node_id: NodeId },

    #[error("Node {node_id} does not validate subnet {subnet_id}")]
    NotValidator { subnet_id: SubnetId, node_id: NodeId },

    #[error("Staking period is not within the validator's period")]
    PeriodMismatch,

    #[error("Delegation would raise {node_id} to {weight}, above {max}")]
    OverDelegated { node_id: NodeId, weight: u64, max: u64 },

    #[error("Node {node_id} is not a permissioned validator of {subnet_id}")]
    NotPermissionedValidator { subnet_id: SubnetId, node_id: NodeId },

    #[error("Subnet {0} has been transformed and is no longer permissioned")]
    SubnetTransformed(SubnetId),

    #[error("Subnet {0} is not permissionless")]
    SubnetNotTransformed(SubnetId),

    #[error("Subnet rewards cannot be paid in the fee asset")]
    TransformWithFeeAsset,

    #[error("Invalid proof of possession")]
    InvalidProofOfPossession,

    #[error("{tx} transactions are not accepted after the Durango upgrade")]
    DisabledAfterDurango { tx: &'static str },

    #[error("{tx} transactions are not accepted after the Banff upgrade")]
    DisabledAfterBanff { tx: &'static str },

    #[error("Shared memory holds UTXO {actual} under key {requested}")]
    ImportedUtxoMismatch { requested: Id, actual: Id },

    #[error("Cannot exchange atomic elements with own chain {0}")]
    SameChainAtomic(ChainId),

    #[error("Proposed time {proposed} is not after chain time {current}")]
    TimestampNotIncreasing { proposed: u64, current: u64 },

    #[error("Proposed time {proposed} is after the next staker change at {next_change}")]
    TimestampBeyondStakerChange { proposed: u64, next_change: u64 },

    #[error("Proposed time {proposed} is beyond local time bound {bound}")]
    TimestampTooFar { proposed: u64, bound: u64 },

    #[error("No current staker is due for removal")]
    NoStakerToRemove,

    #[error("Expected to remove staker {expected}, proposal names {actual}")]
    UnexpectedStaker { expected: TxId, actual: TxId },

    #[error("Staker {tx_id} ends at {end_time}, chain time is {now}")]
    RemoveStakerTooEarly { tx_id: TxId, end_time: u64, now: u64 },

    #[error("Transaction {0} did not create a staker")]
    NotStakerTx(TxId),

    #[error("Shared memory: {0}")]
    SharedMemory(#[from] SharedMemoryError),

    #[error("Ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Codec: {0}")]
    Codec(#[from] CodecError),
}

impl ExecutorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Syntax(_) | ExecutorError::Codec(_) => ErrorKind::Malformed,
            ExecutorError::WrongTxType { .. } => ErrorKind::Contract,
            ExecutorError::UnexpectedStaker { .. } | ExecutorError::NotStakerTx(_) => {
                ErrorKind::Referential
            }
            ExecutorError::SharedMemory(e) => match e {
                SharedMemoryError::Db(_) | SharedMemoryError::Codec(_) => ErrorKind::Storage,
                _ => ErrorKind::Rejected,
            },
            ExecutorError::Ledger(e) => match e {
                LedgerError::Db(_) | LedgerError::Codec(_) => ErrorKind::Storage,
                LedgerError::MissingParentState { .. }
                | LedgerError::WeightOverflow
                | LedgerError::WeightUnderflow { .. }
                | LedgerError::HeightUnavailable { .. }
                | LedgerError::AlreadyInitialized => ErrorKind::Referential,
                _ => ErrorKind::Rejected,
            },
            _ => ErrorKind::Rejected,
        }
    }
}
