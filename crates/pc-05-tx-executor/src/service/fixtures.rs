//! Shared test setup: a genesis ledger, a shared memory and a backend
//! wired to them.

use crate::adapters::SecpFx;
use crate::backend::Backend;
use crate::config::{
    BootstrapMode, ExecutorConfig, FeeConfig, RewardConfig, StakingConfig, UpgradeConfig,
};
use crate::ports::ProofOfPossessionVerifier;
use pc_01_keyed_store::MemoryStore;
use pc_02_shared_memory::{Memory, SharedMemory};
use pc_03_staker_ledger::{Genesis, GenesisStaker, SharedState, State, StateConfig};
use pc_04_state_diff::{Diff, DiffArena};
use shared_types::{
    AddValidatorTx, AssetId, BaseTx, BlockId, ChainId, Codec, Credential, Id, Input, NodeId,
    Output, OutputOwners, ProofOfPossession, ShortId, TransferInput, TransferOutput,
    TransferableInput, TransferableOutput, Tx, UnsignedTx, Utxo, UtxoId, Validator,
};
use std::sync::Arc;

pub const FEE_ASSET: AssetId = Id::from_byte(0xAA);
pub const P_CHAIN: ChainId = Id::from_byte(0xC0);
pub const X_CHAIN: ChainId = Id::from_byte(0xC1);
pub const GENESIS_BLOCK: BlockId = Id::from_byte(0x66);
pub const GENESIS_TIME: u64 = 1_000;
pub const GENESIS_DURATION: u64 = 50_000;
pub const GENESIS_SUPPLY: u64 = 5_000_000;
pub const GENESIS_NODE: NodeId = NodeId::from_byte(1);
pub const OWNER: ShortId = ShortId::from_byte(1);

/// Accepts any proof that is not all zeroes.
pub struct NonZeroPop;

impl ProofOfPossessionVerifier for NonZeroPop {
    fn verify(&self, pop: &ProofOfPossession) -> bool {
        !pop.is_zero()
    }
}

pub fn config() -> ExecutorConfig {
    ExecutorConfig {
        network_id: 1,
        chain_id: P_CHAIN,
        fee_asset_id: FEE_ASSET,
        staking: StakingConfig {
            min_validator_stake: 2_000,
            max_validator_stake: 1_000_000,
            min_delegator_stake: 25,
            min_delegation_fee: 20_000,
            min_stake_duration: 100,
            max_stake_duration: 100_000,
            max_future_start_time: 1_000,
            max_validator_weight_factor: 5,
            uptime_requirement: 800_000,
            reward: RewardConfig {
                max_consumption_rate: 120_000,
                min_consumption_rate: 100_000,
                minting_period: 100_000,
                supply_cap: 10_000_000,
            },
        },
        fees: FeeConfig {
            tx_fee: 1,
            create_subnet_tx_fee: 5,
            create_blockchain_tx_fee: 5,
            transform_subnet_tx_fee: 10,
            add_primary_network_validator_fee: 0,
            add_primary_network_delegator_fee: 0,
            add_subnet_validator_fee: 1,
            add_subnet_delegator_fee: 1,
        },
        upgrades: UpgradeConfig::latest(),
        bootstrap: BootstrapMode::Disabled,
        sync_bound: 10,
    }
}

pub fn owners() -> OutputOwners {
    OutputOwners::single(OWNER)
}

pub fn cred() -> Credential {
    Credential::new(vec![OWNER])
}

pub fn genesis_utxo(tx: u8, amount: u64) -> Utxo {
    Utxo {
        utxo_id: UtxoId::new(Id::from_byte(tx), 0),
        asset_id: FEE_ASSET,
        output: Output::Transfer(TransferOutput::new(amount, owners())),
    }
}

pub fn spend(utxo: &Utxo) -> TransferableInput {
    TransferableInput {
        utxo_id: utxo.utxo_id,
        asset_id: utxo.asset_id,
        input: Input::Transfer(TransferInput {
            amount: utxo.output.amount(),
            sig_indices: vec![0],
        }),
    }
}

pub fn transfer(amount: u64) -> TransferableOutput {
    TransferableOutput::new(FEE_ASSET, Output::Transfer(TransferOutput::new(amount, owners())))
}

pub fn base(ins: Vec<TransferableInput>, outs: Vec<TransferableOutput>) -> BaseTx {
    BaseTx {
        network_id: 1,
        blockchain_id: P_CHAIN,
        outs,
        ins,
        memo: vec![],
    }
}

pub fn genesis(codec: &Codec) -> Genesis {
    let validator = UnsignedTx::AddValidator(AddValidatorTx {
        base: base(vec![], vec![]),
        validator: Validator {
            node_id: GENESIS_NODE,
            start: GENESIS_TIME,
            end: GENESIS_TIME + GENESIS_DURATION,
            weight: 2_000,
        },
        stake_outs: vec![transfer(2_000)],
        rewards_owner: owners(),
        delegation_shares: 100_000,
    });
    Genesis {
        genesis_block_id: GENESIS_BLOCK,
        timestamp: GENESIS_TIME,
        initial_supply: GENESIS_SUPPLY,
        utxos: vec![genesis_utxo(1, 1_000_000), genesis_utxo(2, 500_000)],
        validators: vec![GenesisStaker {
            tx: Tx::new(validator, vec![], codec).unwrap(),
            potential_reward: 0,
        }],
        chains: vec![],
    }
}

/// A committed genesis ledger on its own store.
pub fn state() -> State {
    let codec = Arc::new(Codec::default());
    let mut state =
        State::open(Arc::new(MemoryStore::new()), codec.clone(), StateConfig::default()).unwrap();
    state.initialize(genesis(&codec)).unwrap();
    state
}

pub fn backend() -> Backend {
    Harness::new().backend
}

pub fn set_upgrades(backend: &mut Backend, upgrades: UpgradeConfig) {
    Arc::make_mut(&mut backend.config).upgrades = upgrades;
}

/// Ledger, diff arena and shared memory over one store.
pub struct Harness {
    pub backend: Backend,
    pub store: Arc<MemoryStore>,
    pub memory: Arc<Memory>,
    pub state: SharedState,
    pub arena: Arc<DiffArena>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(config())
    }

    pub fn with_config(config: ExecutorConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let codec = Arc::new(Codec::default());
        let memory = Memory::new(store.clone(), codec.clone());
        let backend = Backend::new(
            config,
            codec.clone(),
            Arc::new(SecpFx),
            Arc::new(NonZeroPop),
            Arc::new(memory.new_shared_memory(P_CHAIN)),
        );
        let mut state = State::open(store.clone(), codec.clone(), StateConfig::default()).unwrap();
        state.initialize(genesis(&codec)).unwrap();
        let state = SharedState::new(state);
        let arena = Arc::new(DiffArena::new(state.clone(), GENESIS_BLOCK));
        Self {
            backend,
            store,
            memory,
            state,
            arena,
        }
    }

    /// A fresh diff over the genesis block.
    pub fn diff(&self) -> Diff {
        Diff::new(GENESIS_BLOCK, self.arena.clone()).unwrap()
    }

    pub fn peer(&self) -> SharedMemory {
        self.memory.new_shared_memory(X_CHAIN)
    }

    pub fn sign(&self, unsigned: UnsignedTx, creds: Vec<Credential>) -> Tx {
        Tx::new(unsigned, creds, &self.backend.codec).unwrap()
    }
}
