//! # Platform Transactions
//!
//! The closed set of transaction kinds accepted by the platform chain.
//! Executors `match` exhaustively on [`UnsignedTx`], so adding a kind forces
//! every executor to handle it.
//!
//! ## Staker priorities
//!
//! Stakers that share a `next_time` are ordered by [`Priority`]. Pending
//! priorities sort before current ones; within each group the order decides
//! which kind of staker is promoted (or removed) first.

use crate::avax::{
    sum_outputs, verify_inputs_unique, Credential, OutputOwners, TransferableInput,
    TransferableOutput,
};
use crate::codec::Codec;
use crate::errors::{CodecError, SyntaxError};
use crate::ids::{AssetId, ChainId, Id, NodeId, SubnetId, TxId, PRIMARY_NETWORK_ID};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

/// Maximum memo length in bytes.
pub const MAX_MEMO_SIZE: usize = 256;

/// Maximum length of a chain name.
pub const MAX_CHAIN_NAME_LEN: usize = 128;

/// Denominator for every rate and share expressed in parts per million.
pub const PERCENT_DENOMINATOR: u32 = 1_000_000;

/// BLS public key (compressed).
pub type BlsPublicKey = [u8; 48];

/// BLS signature (compressed).
pub type BlsSignature = [u8; 96];

/// Tie-break between stakers with equal `next_time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    // Promotion order from pending to current.
    PrimaryNetworkDelegatorApricotPending = 1,
    PrimaryNetworkValidatorPending = 2,
    PrimaryNetworkDelegatorBanffPending = 3,
    SubnetPermissionlessValidatorPending = 4,
    SubnetPermissionlessDelegatorPending = 5,
    SubnetPermissionedValidatorPending = 6,

    // Removal order from current. Permissioned validators go first because
    // they leave by time advancement rather than by a reward transaction.
    SubnetPermissionedValidatorCurrent = 7,
    SubnetPermissionlessDelegatorCurrent = 8,
    SubnetPermissionlessValidatorCurrent = 9,
    PrimaryNetworkDelegatorCurrent = 10,
    PrimaryNetworkValidatorCurrent = 11,
}

impl Priority {
    pub fn is_current(&self) -> bool {
        *self >= Priority::SubnetPermissionedValidatorCurrent
    }

    pub fn is_pending(&self) -> bool {
        !self.is_current()
    }

    pub fn is_validator(&self) -> bool {
        matches!(
            self,
            Priority::PrimaryNetworkValidatorPending
                | Priority::SubnetPermissionlessValidatorPending
                | Priority::SubnetPermissionedValidatorPending
                | Priority::SubnetPermissionedValidatorCurrent
                | Priority::SubnetPermissionlessValidatorCurrent
                | Priority::PrimaryNetworkValidatorCurrent
        )
    }

    pub fn is_permissioned_validator(&self) -> bool {
        matches!(
            self,
            Priority::SubnetPermissionedValidatorPending
                | Priority::SubnetPermissionedValidatorCurrent
        )
    }

    /// Priority the staker takes once promoted from the pending set.
    pub fn as_current(&self) -> Priority {
        match self {
            Priority::PrimaryNetworkDelegatorApricotPending
            | Priority::PrimaryNetworkDelegatorBanffPending => {
                Priority::PrimaryNetworkDelegatorCurrent
            }
            Priority::PrimaryNetworkValidatorPending => Priority::PrimaryNetworkValidatorCurrent,
            Priority::SubnetPermissionlessValidatorPending => {
                Priority::SubnetPermissionlessValidatorCurrent
            }
            Priority::SubnetPermissionlessDelegatorPending => {
                Priority::SubnetPermissionlessDelegatorCurrent
            }
            Priority::SubnetPermissionedValidatorPending => {
                Priority::SubnetPermissionedValidatorCurrent
            }
            current => *current,
        }
    }
}

/// Where a transaction stands from the ledger's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    Committed,
    Aborted,
    Processing,
    Dropped,
    Unknown,
}

/// Static checks need to know which network and chain they run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub network_id: u32,
    pub chain_id: ChainId,
}

/// Fields common to every fee-paying transaction.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseTx {
    pub network_id: u32,
    pub blockchain_id: ChainId,
    pub outs: Vec<TransferableOutput>,
    pub ins: Vec<TransferableInput>,
    pub memo: Vec<u8>,
}

impl BaseTx {
    pub fn verify(&self, ctx: &TxContext) -> Result<(), SyntaxError> {
        if self.network_id != ctx.network_id {
            return Err(SyntaxError::WrongNetworkId {
                expected: ctx.network_id,
                actual: self.network_id,
            });
        }
        if self.blockchain_id != ctx.chain_id {
            return Err(SyntaxError::WrongChainId);
        }
        if self.memo.len() > MAX_MEMO_SIZE {
            return Err(SyntaxError::MemoTooLarge {
                size: self.memo.len(),
                max: MAX_MEMO_SIZE,
            });
        }
        for out in &self.outs {
            out.verify()?;
        }
        for input in &self.ins {
            input.verify()?;
        }
        verify_inputs_unique(&self.ins)
    }
}

/// Node, window and weight of a staker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub node_id: NodeId,
    pub start: u64,
    pub end: u64,
    pub weight: u64,
}

impl Validator {
    pub fn duration(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    fn verify(&self) -> Result<(), SyntaxError> {
        if self.node_id == NodeId::EMPTY {
            return Err(SyntaxError::EmptyNodeId);
        }
        if self.weight == 0 {
            return Err(SyntaxError::ZeroWeight);
        }
        if self.start >= self.end {
            return Err(SyntaxError::InvalidStakingPeriod {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }
}

/// Signature indices authorising a subnet-owner action. The matching
/// credential is the last one attached to the transaction.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubnetAuth {
    pub sig_indices: Vec<u32>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfPossession {
    #[serde_as(as = "Bytes")]
    pub public_key: BlsPublicKey,
    #[serde_as(as = "Bytes")]
    pub signature: BlsSignature,
}

impl ProofOfPossession {
    pub fn is_zero(&self) -> bool {
        self.public_key.iter().all(|b| *b == 0) && self.signature.iter().all(|b| *b == 0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signer {
    Empty,
    ProofOfPossession(ProofOfPossession),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake_outs: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
    pub delegation_shares: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDelegatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub stake_outs: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSubnetValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: SubnetId,
    pub subnet_auth: SubnetAuth,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPermissionlessValidatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: SubnetId,
    pub signer: Signer,
    pub stake_outs: Vec<TransferableOutput>,
    pub validator_rewards_owner: OutputOwners,
    pub delegator_rewards_owner: OutputOwners,
    pub delegation_shares: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPermissionlessDelegatorTx {
    pub base: BaseTx,
    pub validator: Validator,
    pub subnet_id: SubnetId,
    pub stake_outs: Vec<TransferableOutput>,
    pub rewards_owner: OutputOwners,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSubnetValidatorTx {
    pub base: BaseTx,
    pub node_id: NodeId,
    pub subnet_id: SubnetId,
    pub subnet_auth: SubnetAuth,
}

/// Turns a permissioned subnet into a permissionless one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSubnetTx {
    pub base: BaseTx,
    pub subnet_id: SubnetId,
    pub asset_id: AssetId,
    pub initial_supply: u64,
    pub maximum_supply: u64,
    pub min_consumption_rate: u64,
    pub max_consumption_rate: u64,
    pub min_validator_stake: u64,
    pub max_validator_stake: u64,
    pub min_stake_duration: u64,
    pub max_stake_duration: u64,
    pub min_delegation_fee: u32,
    pub min_delegator_stake: u64,
    pub max_validator_weight_factor: u8,
    /// Parts per million.
    pub uptime_requirement: u32,
    pub subnet_auth: SubnetAuth,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubnetTx {
    pub base: BaseTx,
    pub owner: OutputOwners,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChainTx {
    pub base: BaseTx,
    pub subnet_id: SubnetId,
    pub chain_name: String,
    pub vm_id: Id,
    pub fx_ids: Vec<Id>,
    pub genesis_data: Vec<u8>,
    pub subnet_auth: SubnetAuth,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTx {
    pub base: BaseTx,
    pub source_chain: ChainId,
    pub imported_inputs: Vec<TransferableInput>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTx {
    pub base: BaseTx,
    pub destination_chain: ChainId,
    pub exported_outputs: Vec<TransferableOutput>,
}

/// Pre-Banff proposal to move chain time forward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvanceTimeTx {
    pub time: u64,
}

/// Proposal to remove the staker created by `tx_id` and settle its reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardValidatorTx {
    pub tx_id: TxId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsignedTx {
    AddValidator(AddValidatorTx),
    AddSubnetValidator(AddSubnetValidatorTx),
    AddDelegator(AddDelegatorTx),
    AddPermissionlessValidator(AddPermissionlessValidatorTx),
    AddPermissionlessDelegator(AddPermissionlessDelegatorTx),
    RemoveSubnetValidator(RemoveSubnetValidatorTx),
    TransformSubnet(TransformSubnetTx),
    CreateSubnet(CreateSubnetTx),
    CreateChain(CreateChainTx),
    Import(ImportTx),
    Export(ExportTx),
    AdvanceTime(AdvanceTimeTx),
    RewardValidator(RewardValidatorTx),
}

/// What a staking transaction says about the staker it creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StakerTxInfo {
    pub node_id: NodeId,
    pub subnet_id: SubnetId,
    pub weight: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub public_key: Option<BlsPublicKey>,
    pub pending_priority: Priority,
    pub current_priority: Priority,
}

impl StakerTxInfo {
    pub fn is_validator(&self) -> bool {
        self.current_priority.is_validator()
    }
}

impl UnsignedTx {
    pub fn name(&self) -> &'static str {
        match self {
            UnsignedTx::AddValidator(_) => "add_validator",
            UnsignedTx::AddSubnetValidator(_) => "add_subnet_validator",
            UnsignedTx::AddDelegator(_) => "add_delegator",
            UnsignedTx::AddPermissionlessValidator(_) => "add_permissionless_validator",
            UnsignedTx::AddPermissionlessDelegator(_) => "add_permissionless_delegator",
            UnsignedTx::RemoveSubnetValidator(_) => "remove_subnet_validator",
            UnsignedTx::TransformSubnet(_) => "transform_subnet",
            UnsignedTx::CreateSubnet(_) => "create_subnet",
            UnsignedTx::CreateChain(_) => "create_chain",
            UnsignedTx::Import(_) => "import",
            UnsignedTx::Export(_) => "export",
            UnsignedTx::AdvanceTime(_) => "advance_time",
            UnsignedTx::RewardValidator(_) => "reward_validator",
        }
    }

    /// The fee-paying part, absent for proposal-only kinds.
    pub fn base(&self) -> Option<&BaseTx> {
        match self {
            UnsignedTx::AddValidator(tx) => Some(&tx.base),
            UnsignedTx::AddSubnetValidator(tx) => Some(&tx.base),
            UnsignedTx::AddDelegator(tx) => Some(&tx.base),
            UnsignedTx::AddPermissionlessValidator(tx) => Some(&tx.base),
            UnsignedTx::AddPermissionlessDelegator(tx) => Some(&tx.base),
            UnsignedTx::RemoveSubnetValidator(tx) => Some(&tx.base),
            UnsignedTx::TransformSubnet(tx) => Some(&tx.base),
            UnsignedTx::CreateSubnet(tx) => Some(&tx.base),
            UnsignedTx::CreateChain(tx) => Some(&tx.base),
            UnsignedTx::Import(tx) => Some(&tx.base),
            UnsignedTx::Export(tx) => Some(&tx.base),
            UnsignedTx::AdvanceTime(_) | UnsignedTx::RewardValidator(_) => None,
        }
    }

    /// IDs of every UTXO this transaction consumes, including imported ones.
    pub fn input_ids(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self
            .base()
            .map(|base| base.ins.iter().map(|i| i.input_id()).collect())
            .unwrap_or_default();
        if let UnsignedTx::Import(tx) = self {
            ids.extend(tx.imported_inputs.iter().map(|i| i.input_id()));
        }
        ids
    }

    /// Staker description for the five staking kinds.
    pub fn staker(&self) -> Option<StakerTxInfo> {
        let info = |v: &Validator, subnet_id, public_key, pending, current| StakerTxInfo {
            node_id: v.node_id,
            subnet_id,
            weight: v.weight,
            start_time: v.start,
            end_time: v.end,
            public_key,
            pending_priority: pending,
            current_priority: current,
        };
        match self {
            UnsignedTx::AddValidator(tx) => Some(info(
                &tx.validator,
                PRIMARY_NETWORK_ID,
                None,
                Priority::PrimaryNetworkValidatorPending,
                Priority::PrimaryNetworkValidatorCurrent,
            )),
            UnsignedTx::AddDelegator(tx) => Some(info(
                &tx.validator,
                PRIMARY_NETWORK_ID,
                None,
                Priority::PrimaryNetworkDelegatorApricotPending,
                Priority::PrimaryNetworkDelegatorCurrent,
            )),
            UnsignedTx::AddSubnetValidator(tx) => Some(info(
                &tx.validator,
                tx.subnet_id,
                None,
                Priority::SubnetPermissionedValidatorPending,
                Priority::SubnetPermissionedValidatorCurrent,
            )),
            UnsignedTx::AddPermissionlessValidator(tx) => {
                let public_key = match &tx.signer {
                    Signer::ProofOfPossession(pop) => Some(pop.public_key),
                    Signer::Empty => None,
                };
                let (pending, current) = if tx.subnet_id == PRIMARY_NETWORK_ID {
                    (
                        Priority::PrimaryNetworkValidatorPending,
                        Priority::PrimaryNetworkValidatorCurrent,
                    )
                } else {
                    (
                        Priority::SubnetPermissionlessValidatorPending,
                        Priority::SubnetPermissionlessValidatorCurrent,
                    )
                };
                Some(info(&tx.validator, tx.subnet_id, public_key, pending, current))
            }
            UnsignedTx::AddPermissionlessDelegator(tx) => {
                let (pending, current) = if tx.subnet_id == PRIMARY_NETWORK_ID {
                    (
                        Priority::PrimaryNetworkDelegatorBanffPending,
                        Priority::PrimaryNetworkDelegatorCurrent,
                    )
                } else {
                    (
                        Priority::SubnetPermissionlessDelegatorPending,
                        Priority::SubnetPermissionlessDelegatorCurrent,
                    )
                };
                Some(info(&tx.validator, tx.subnet_id, None, pending, current))
            }
            _ => None,
        }
    }

    /// Stake returned to the owner when the staker leaves.
    pub fn stake_outs(&self) -> &[TransferableOutput] {
        match self {
            UnsignedTx::AddValidator(tx) => &tx.stake_outs,
            UnsignedTx::AddDelegator(tx) => &tx.stake_outs,
            UnsignedTx::AddPermissionlessValidator(tx) => &tx.stake_outs,
            UnsignedTx::AddPermissionlessDelegator(tx) => &tx.stake_outs,
            _ => &[],
        }
    }

    /// Stateless well-formedness. Runs before any ledger access.
    pub fn syntactic_verify(&self, ctx: &TxContext) -> Result<(), SyntaxError> {
        match self {
            UnsignedTx::AddValidator(tx) => {
                tx.base.verify(ctx)?;
                tx.validator.verify()?;
                verify_shares(tx.delegation_shares)?;
                verify_stake(&tx.stake_outs, tx.validator.weight)?;
                tx.rewards_owner.verify()
            }
            UnsignedTx::AddDelegator(tx) => {
                tx.base.verify(ctx)?;
                tx.validator.verify()?;
                verify_stake(&tx.stake_outs, tx.validator.weight)?;
                tx.rewards_owner.verify()
            }
            UnsignedTx::AddSubnetValidator(tx) => {
                tx.base.verify(ctx)?;
                tx.validator.verify()?;
                verify_not_primary(tx.subnet_id)
            }
            UnsignedTx::AddPermissionlessValidator(tx) => {
                tx.base.verify(ctx)?;
                tx.validator.verify()?;
                verify_shares(tx.delegation_shares)?;
                verify_stake(&tx.stake_outs, tx.validator.weight)?;
                tx.validator_rewards_owner.verify()?;
                tx.delegator_rewards_owner.verify()?;
                match (&tx.signer, tx.subnet_id == PRIMARY_NETWORK_ID) {
                    (Signer::ProofOfPossession(_), true) | (Signer::Empty, false) => Ok(()),
                    (Signer::Empty, true) => Err(SyntaxError::InvalidSigner(
                        "primary network validators require a proof of possession".into(),
                    )),
                    (Signer::ProofOfPossession(_), false) => Err(SyntaxError::InvalidSigner(
                        "subnet validators must not register a BLS key".into(),
                    )),
                }
            }
            UnsignedTx::AddPermissionlessDelegator(tx) => {
                tx.base.verify(ctx)?;
                tx.validator.verify()?;
                verify_stake(&tx.stake_outs, tx.validator.weight)?;
                tx.rewards_owner.verify()
            }
            UnsignedTx::RemoveSubnetValidator(tx) => {
                tx.base.verify(ctx)?;
                verify_not_primary(tx.subnet_id)
            }
            UnsignedTx::TransformSubnet(tx) => {
                tx.base.verify(ctx)?;
                verify_not_primary(tx.subnet_id)?;
                verify_transformation(tx)
            }
            UnsignedTx::CreateSubnet(tx) => {
                tx.base.verify(ctx)?;
                tx.owner.verify()
            }
            UnsignedTx::CreateChain(tx) => {
                tx.base.verify(ctx)?;
                verify_not_primary(tx.subnet_id)?;
                if tx.chain_name.len() > MAX_CHAIN_NAME_LEN {
                    return Err(SyntaxError::ChainNameTooLong {
                        len: tx.chain_name.len(),
                        max: MAX_CHAIN_NAME_LEN,
                    });
                }
                Ok(())
            }
            UnsignedTx::Import(tx) => {
                tx.base.verify(ctx)?;
                if tx.imported_inputs.is_empty() {
                    return Err(SyntaxError::NoImportedInputs);
                }
                for input in &tx.imported_inputs {
                    input.verify()?;
                }
                let mut all = tx.base.ins.clone();
                all.extend(tx.imported_inputs.iter().cloned());
                verify_inputs_unique(&all)
            }
            UnsignedTx::Export(tx) => {
                tx.base.verify(ctx)?;
                if tx.exported_outputs.is_empty() {
                    return Err(SyntaxError::NoExportedOutputs);
                }
                for out in &tx.exported_outputs {
                    out.verify()?;
                }
                Ok(())
            }
            UnsignedTx::AdvanceTime(_) | UnsignedTx::RewardValidator(_) => Ok(()),
        }
    }
}

fn verify_shares(shares: u32) -> Result<(), SyntaxError> {
    if shares > PERCENT_DENOMINATOR {
        return Err(SyntaxError::TooManyShares {
            shares,
            max: PERCENT_DENOMINATOR,
        });
    }
    Ok(())
}

fn verify_stake(stake_outs: &[TransferableOutput], weight: u64) -> Result<(), SyntaxError> {
    if stake_outs.is_empty() {
        return Err(SyntaxError::NoStake);
    }
    for out in stake_outs {
        out.verify()?;
    }
    let staked = sum_outputs(stake_outs)?;
    if staked != weight {
        return Err(SyntaxError::StakeWeightMismatch { staked, weight });
    }
    Ok(())
}

fn verify_not_primary(subnet_id: SubnetId) -> Result<(), SyntaxError> {
    if subnet_id == PRIMARY_NETWORK_ID {
        return Err(SyntaxError::PrimaryNetworkNotAllowed);
    }
    Ok(())
}

fn verify_transformation(tx: &TransformSubnetTx) -> Result<(), SyntaxError> {
    let invalid = |msg: &str| Err(SyntaxError::InvalidTransformation(msg.to_string()));
    if tx.asset_id.is_empty() {
        return invalid("empty asset ID");
    }
    if tx.initial_supply == 0 || tx.initial_supply > tx.maximum_supply {
        return invalid("initial supply must be in (0, maximum supply]");
    }
    if tx.min_consumption_rate > tx.max_consumption_rate
        || tx.max_consumption_rate > PERCENT_DENOMINATOR as u64
    {
        return invalid("consumption rates out of order");
    }
    if tx.min_validator_stake == 0
        || tx.min_validator_stake > tx.initial_supply
        || tx.min_validator_stake > tx.max_validator_stake
        || tx.max_validator_stake > tx.maximum_supply
    {
        return invalid("validator stake bounds");
    }
    if tx.min_stake_duration == 0 || tx.min_stake_duration > tx.max_stake_duration {
        return invalid("stake duration bounds");
    }
    if tx.min_delegation_fee > PERCENT_DENOMINATOR {
        return invalid("delegation fee");
    }
    if tx.min_delegator_stake == 0 || tx.max_validator_weight_factor == 0 {
        return invalid("delegator bounds");
    }
    if tx.uptime_requirement > PERCENT_DENOMINATOR {
        return invalid("uptime requirement");
    }
    Ok(())
}

#[derive(Serialize)]
struct SignedRef<'a> {
    unsigned: &'a UnsignedTx,
    credentials: &'a [Credential],
}

#[derive(Deserialize)]
struct SignedOwned {
    unsigned: UnsignedTx,
    credentials: Vec<Credential>,
}

/// A transaction with its credentials, ID and canonical bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tx {
    unsigned: UnsignedTx,
    credentials: Vec<Credential>,
    id: TxId,
    bytes: Vec<u8>,
}

impl Tx {
    pub fn new(
        unsigned: UnsignedTx,
        credentials: Vec<Credential>,
        codec: &Codec,
    ) -> Result<Self, CodecError> {
        let bytes = codec.marshal(&SignedRef {
            unsigned: &unsigned,
            credentials: &credentials,
        })?;
        Ok(Self {
            id: Id::hash(&bytes),
            unsigned,
            credentials,
            bytes,
        })
    }

    pub fn parse(bytes: &[u8], codec: &Codec) -> Result<Self, CodecError> {
        let signed: SignedOwned = codec.unmarshal(bytes)?;
        Ok(Self {
            unsigned: signed.unsigned,
            credentials: signed.credentials,
            id: Id::hash(bytes),
            bytes: bytes.to_vec(),
        })
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn unsigned(&self) -> &UnsignedTx {
        &self.unsigned
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}
