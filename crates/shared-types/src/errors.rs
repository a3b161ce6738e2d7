//! # Error Types
//!
//! Errors shared across subsystems: codec failures and syntactic
//! (stateless) transaction verification failures.

use thiserror::Error;

/// Errors raised by the versioned codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Blob too short: {len} bytes")]
    TooShort { len: usize },

    #[error("Unknown codec version: expected {expected}, found {found}")]
    UnknownVersion { expected: u16, found: u16 },

    #[error("Blob too large: {size} bytes > {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Stateless well-formedness failures. Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Wrong network ID: expected {expected}, got {actual}")]
    WrongNetworkId { expected: u32, actual: u32 },

    #[error("Wrong blockchain ID")]
    WrongChainId,

    #[error("Memo too large: {size} bytes > {max} bytes")]
    MemoTooLarge { size: usize, max: usize },

    #[error("Output has zero amount")]
    ZeroAmount,

    #[error("Output unspendable: threshold {threshold} > {addresses} addresses")]
    OutputUnspendable { threshold: u32, addresses: usize },

    #[error("Output unoptimized: zero threshold with {addresses} addresses")]
    OutputUnoptimized { addresses: usize },

    #[error("Addresses not sorted and unique")]
    AddressesNotSortedUnique,

    #[error("Signature indices not sorted and unique")]
    SigIndicesNotSortedUnique,

    #[error("Duplicate input: {0}")]
    DuplicateInput(String),

    #[error("Nested stakeable lock")]
    NestedStakeableLock,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("No stake outputs")]
    NoStake,

    #[error("Stake amount {staked} does not match validator weight {weight}")]
    StakeWeightMismatch { staked: u64, weight: u64 },

    #[error("Invalid staking period: start {start} >= end {end}")]
    InvalidStakingPeriod { start: u64, end: u64 },

    #[error("Delegation shares {shares} exceed {max}")]
    TooManyShares { shares: u32, max: u32 },

    #[error("Zero weight")]
    ZeroWeight,

    #[error("Empty node ID")]
    EmptyNodeId,

    #[error("Primary network subnet not allowed here")]
    PrimaryNetworkNotAllowed,

    #[error("No exported outputs")]
    NoExportedOutputs,

    #[error("No imported inputs")]
    NoImportedInputs,

    #[error("Chain name too long: {len} > {max}")]
    ChainNameTooLong { len: usize, max: usize },

    #[error("Invalid subnet transformation: {0}")]
    InvalidTransformation(String),

    #[error("Invalid signer: {0}")]
    InvalidSigner(String),
}
