//! # UTXO Model
//!
//! Outputs, inputs, credentials and UTXOs shared by the ledger, the
//! transaction executor and the cross-chain shared memory.
//!
//! ## Locking
//!
//! - `OutputOwners::locktime`: the output cannot be spent before this time.
//! - `Output::StakeableLock`: the output can only be spent into stake before
//!   `locktime`, after which it behaves like its inner transfer output.

use crate::errors::SyntaxError;
use crate::ids::{AssetId, Id, ShortId, TxId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Who may spend an output and from when.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OutputOwners {
    pub locktime: u64,
    pub threshold: u32,
    /// Must be sorted and unique.
    pub addresses: Vec<ShortId>,
}

impl OutputOwners {
    pub fn new(locktime: u64, threshold: u32, mut addresses: Vec<ShortId>) -> Self {
        addresses.sort();
        addresses.dedup();
        Self {
            locktime,
            threshold,
            addresses,
        }
    }

    /// Single-address, threshold-1, unlocked owner.
    pub fn single(address: ShortId) -> Self {
        Self::new(0, 1, vec![address])
    }

    pub fn verify(&self) -> Result<(), SyntaxError> {
        let count = self.addresses.len();
        if self.threshold as usize > count {
            return Err(SyntaxError::OutputUnspendable {
                threshold: self.threshold,
                addresses: count,
            });
        }
        if self.threshold == 0 && count > 0 {
            return Err(SyntaxError::OutputUnoptimized { addresses: count });
        }
        if !is_sorted_unique(&self.addresses) {
            return Err(SyntaxError::AddressesNotSortedUnique);
        }
        Ok(())
    }

    /// Stable identity of this owner structure, used to group locked funds.
    pub fn owner_id(&self) -> Id {
        let mut hasher = Sha256::new();
        hasher.update(self.locktime.to_be_bytes());
        hasher.update(self.threshold.to_be_bytes());
        for addr in &self.addresses {
            hasher.update(addr.0);
        }
        Id(hasher.finalize().into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutput {
    pub amount: u64,
    pub owners: OutputOwners,
}

impl TransferOutput {
    pub fn new(amount: u64, owners: OutputOwners) -> Self {
        Self { amount, owners }
    }

    pub fn verify(&self) -> Result<(), SyntaxError> {
        if self.amount == 0 {
            return Err(SyntaxError::ZeroAmount);
        }
        self.owners.verify()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Output {
    Transfer(TransferOutput),
    StakeableLock { locktime: u64, output: TransferOutput },
}

impl Output {
    pub fn amount(&self) -> u64 {
        self.transfer().amount
    }

    pub fn owners(&self) -> &OutputOwners {
        &self.transfer().owners
    }

    pub fn transfer(&self) -> &TransferOutput {
        match self {
            Output::Transfer(out) => out,
            Output::StakeableLock { output, .. } => output,
        }
    }

    /// Stakeable lock time, `0` for plain transfer outputs.
    pub fn stakeable_locktime(&self) -> u64 {
        match self {
            Output::Transfer(_) => 0,
            Output::StakeableLock { locktime, .. } => *locktime,
        }
    }

    pub fn verify(&self) -> Result<(), SyntaxError> {
        self.transfer().verify()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableOutput {
    pub asset_id: AssetId,
    pub output: Output,
}

impl TransferableOutput {
    pub fn new(asset_id: AssetId, output: Output) -> Self {
        Self { asset_id, output }
    }

    pub fn verify(&self) -> Result<(), SyntaxError> {
        self.output.verify()
    }
}

/// Position of an output within the transaction that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtxoId {
    pub tx_id: TxId,
    pub output_index: u32,
}

impl UtxoId {
    pub fn new(tx_id: TxId, output_index: u32) -> Self {
        Self {
            tx_id,
            output_index,
        }
    }

    /// Storage key of the UTXO, also its key in shared memory.
    pub fn input_id(&self) -> Id {
        self.tx_id.prefixed(self.output_index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub utxo_id: UtxoId,
    pub asset_id: AssetId,
    pub output: Output,
}

impl Utxo {
    pub fn input_id(&self) -> Id {
        self.utxo_id.input_id()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferInput {
    pub amount: u64,
    /// Indices into the spent output's address list. Sorted, unique.
    pub sig_indices: Vec<u32>,
}

impl TransferInput {
    pub fn verify(&self) -> Result<(), SyntaxError> {
        if self.amount == 0 {
            return Err(SyntaxError::ZeroAmount);
        }
        if !is_sorted_unique(&self.sig_indices) {
            return Err(SyntaxError::SigIndicesNotSortedUnique);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Input {
    Transfer(TransferInput),
    StakeableLock { locktime: u64, input: TransferInput },
}

impl Input {
    pub fn amount(&self) -> u64 {
        self.transfer().amount
    }

    pub fn transfer(&self) -> &TransferInput {
        match self {
            Input::Transfer(input) => input,
            Input::StakeableLock { input, .. } => input,
        }
    }

    pub fn stakeable_locktime(&self) -> u64 {
        match self {
            Input::Transfer(_) => 0,
            Input::StakeableLock { locktime, .. } => *locktime,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferableInput {
    pub utxo_id: UtxoId,
    pub asset_id: AssetId,
    pub input: Input,
}

impl TransferableInput {
    pub fn input_id(&self) -> Id {
        self.utxo_id.input_id()
    }

    pub fn verify(&self) -> Result<(), SyntaxError> {
        self.input.transfer().verify()
    }
}

/// Addresses recovered from the signatures attached to one input.
///
/// Signature recovery happens outside the ledger; the executor only checks
/// that the recovered addresses satisfy the spent output's owners.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credential {
    pub signers: Vec<ShortId>,
}

impl Credential {
    pub fn new(signers: Vec<ShortId>) -> Self {
        Self { signers }
    }
}

/// Checks inputs are sorted by input ID with no duplicates.
pub fn verify_inputs_unique(ins: &[TransferableInput]) -> Result<(), SyntaxError> {
    for pair in ins.windows(2) {
        let (a, b) = (pair[0].input_id(), pair[1].input_id());
        if a == b {
            return Err(SyntaxError::DuplicateInput(a.to_string()));
        }
    }
    let mut ids: Vec<Id> = ins.iter().map(|i| i.input_id()).collect();
    ids.sort();
    ids.dedup();
    if ids.len() != ins.len() {
        return Err(SyntaxError::DuplicateInput("non-adjacent".to_string()));
    }
    Ok(())
}

/// Sums output amounts, rejecting overflow.
pub fn sum_outputs(outs: &[TransferableOutput]) -> Result<u64, SyntaxError> {
    outs.iter().try_fold(0u64, |acc, out| {
        acc.checked_add(out.output.amount())
            .ok_or(SyntaxError::AmountOverflow)
    })
}

fn is_sorted_unique<T: Ord>(items: &[T]) -> bool {
    items.windows(2).all(|w| w[0] < w[1])
}
