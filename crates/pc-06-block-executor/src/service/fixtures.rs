//! Test setup: a genesis ledger on one store, a manager over it, and
//! controllable clock, uptime and chain-creation collaborators.

use super::lock::ChainLock;
use super::manager::{BlockManager, ManagerPorts};
use crate::adapters::ManualClock;
use crate::config::ManagerConfig;
use crate::domain::{Block, BlockBody};
use crate::errors::UptimeError;
use crate::ports::{ChainCreator, Uptime};
use parking_lot::Mutex;
use pc_01_keyed_store::MemoryStore;
use pc_02_shared_memory::{Element, Memory, Requests, SharedMemory};
use pc_03_staker_ledger::{Genesis, GenesisStaker, SharedState, State, StateConfig};
use pc_04_state_diff::DiffArena;
use pc_05_tx_executor::{
    Backend, BootstrapMode, ExecutorConfig, FeeConfig, ProofOfPossessionVerifier, RewardConfig,
    SecpFx, StakingConfig, UpgradeConfig,
};
use shared_types::{
    AddValidatorTx, AssetId, BaseTx, BlockId, ChainId, Codec, CreateSubnetTx, Credential, Id,
    ImportTx, Input, NodeId, Output, OutputOwners, ProofOfPossession, ShortId, SubnetId,
    TransferInput, TransferOutput, TransferableInput, TransferableOutput, Tx, UnsignedTx, Utxo,
    UtxoId, Validator,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const FEE_ASSET: AssetId = Id::from_byte(0xAA);
pub const P_CHAIN: ChainId = Id::from_byte(0xC0);
pub const X_CHAIN: ChainId = Id::from_byte(0xC1);
pub const GENESIS_BLOCK: BlockId = Id::from_byte(0x66);
pub const GENESIS_TIME: u64 = 1_000;
pub const GENESIS_END: u64 = GENESIS_TIME + 50_000;
pub const GENESIS_NODE: NodeId = NodeId::from_byte(1);
pub const OWNER: ShortId = ShortId::from_byte(1);

pub struct NonZeroPop;

impl ProofOfPossessionVerifier for NonZeroPop {
    fn verify(&self, pop: &ProofOfPossession) -> bool {
        !pop.is_zero()
    }
}

/// Reports the same uptime for every node, or fails when unset.
#[derive(Default)]
pub struct FixedUptime {
    uptime: Mutex<Option<f64>>,
}

impl FixedUptime {
    pub fn set(&self, uptime: Option<f64>) {
        *self.uptime.lock() = uptime;
    }
}

impl Uptime for FixedUptime {
    fn calculate_uptime_percent_from(
        &self,
        node_id: NodeId,
        _subnet_id: SubnetId,
        _start_time: u64,
    ) -> Result<f64, UptimeError> {
        (*self.uptime.lock()).ok_or(UptimeError::NotTracked(node_id))
    }
}

#[derive(Default)]
pub struct RecordingCreator {
    pub created: Mutex<Vec<(ChainId, SubnetId)>>,
}

impl ChainCreator for RecordingCreator {
    fn queue_chain_creation(&self, chain_id: ChainId, subnet_id: SubnetId, _tx: &Tx) {
        self.created.lock().push((chain_id, subnet_id));
    }
}

pub fn executor_config() -> ExecutorConfig {
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
            uptime_requirement: 600_000,
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

pub fn genesis_validator(codec: &Codec) -> Tx {
    let unsigned = UnsignedTx::AddValidator(AddValidatorTx {
        base: base(vec![], vec![]),
        validator: Validator {
            node_id: GENESIS_NODE,
            start: GENESIS_TIME,
            end: GENESIS_END,
            weight: 2_000,
        },
        stake_outs: vec![transfer(2_000)],
        rewards_owner: owners(),
        delegation_shares: 100_000,
    });
    Tx::new(unsigned, vec![], codec).unwrap()
}

pub fn genesis(codec: &Codec) -> Genesis {
    Genesis {
        genesis_block_id: GENESIS_BLOCK,
        timestamp: GENESIS_TIME,
        initial_supply: 5_000_000,
        utxos: vec![genesis_utxo(1, 1_000_000), genesis_utxo(2, 500_000)],
        validators: vec![GenesisStaker {
            tx: genesis_validator(codec),
            potential_reward: 0,
        }],
        chains: vec![],
    }
}

pub struct Harness {
    pub manager: Arc<BlockManager>,
    pub lock: ChainLock,
    pub clock: Arc<ManualClock>,
    pub uptimes: Arc<FixedUptime>,
    pub creator: Arc<RecordingCreator>,
    pub memory: Arc<Memory>,
    pub state: SharedState,
    pub arena: Arc<DiffArena>,
    pub codec: Arc<Codec>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        Self::build(config, executor_config())
    }

    pub fn apricot() -> Self {
        let mut executor = executor_config();
        executor.upgrades = UpgradeConfig::apricot();
        Self::build(ManagerConfig::default(), executor)
    }

    fn build(config: ManagerConfig, executor: ExecutorConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let codec = Arc::new(Codec::default());
        let memory = Memory::new(store.clone(), codec.clone());
        let backend = Backend::new(
            executor,
            codec.clone(),
            Arc::new(SecpFx),
            Arc::new(NonZeroPop),
            Arc::new(memory.new_shared_memory(P_CHAIN)),
        );
        let mut state = State::open(store, codec.clone(), StateConfig::default()).unwrap();
        state.initialize(genesis(&codec)).unwrap();
        let state = SharedState::new(state);
        let arena = Arc::new(DiffArena::new(state.clone(), GENESIS_BLOCK));

        let lock = ChainLock::new();
        let clock = Arc::new(ManualClock::new(GENESIS_TIME));
        let uptimes = Arc::new(FixedUptime::default());
        let creator = Arc::new(RecordingCreator::default());
        let manager = Arc::new(BlockManager::new(
            lock.clone(),
            config,
            backend,
            arena.clone(),
            Arc::new(memory.new_shared_memory(P_CHAIN)),
            ManagerPorts {
                chain_creator: creator.clone(),
                uptimes: uptimes.clone(),
                clock: clock.clone(),
            },
        ));
        Self {
            manager,
            lock,
            clock,
            uptimes,
            creator,
            memory,
            state,
            arena,
            codec,
        }
    }

    pub fn sign(&self, unsigned: UnsignedTx) -> Tx {
        Tx::new(unsigned, vec![cred()], &self.codec).unwrap()
    }

    pub fn block(&self, parent_id: BlockId, height: u64, body: BlockBody) -> Block {
        Block::new(parent_id, height, body, &self.codec).unwrap()
    }

    /// A Banff standard block on top of the last accepted block.
    pub fn standard(&self, timestamp: u64, txs: Vec<Tx>) -> Block {
        let (parent_id, height) = {
            let state = self.state.read();
            (state.last_accepted(), state.height() + 1)
        };
        self.block(parent_id, height, BlockBody::BanffStandard { timestamp, txs })
    }

    pub fn create_subnet(&self, utxo: &Utxo, memo: u8) -> Tx {
        let mut base = base(vec![spend(utxo)], vec![transfer(utxo.output.amount() - 5)]);
        base.memo = vec![memo];
        self.sign(UnsignedTx::CreateSubnet(CreateSubnetTx {
            base,
            owner: owners(),
        }))
    }

    pub fn peer(&self) -> SharedMemory {
        self.memory.new_shared_memory(X_CHAIN)
    }

    /// Puts `utxo` into the inbound namespace of the platform chain, as an
    /// accepted export on the peer chain would.
    pub fn deliver(&self, utxo: &Utxo) {
        let element = Element {
            key: utxo.input_id().as_bytes().to_vec(),
            value: self.codec.marshal(utxo).unwrap(),
            traits: vec![OWNER.as_bytes().to_vec()],
        };
        self.peer()
            .apply(
                &BTreeMap::from([(
                    P_CHAIN,
                    Requests {
                        remove_requests: vec![],
                        put_requests: vec![element],
                    },
                )]),
                vec![],
            )
            .unwrap();
    }

    pub fn import(&self, utxo: &Utxo, memo: u8) -> Tx {
        let mut base = base(vec![], vec![transfer(utxo.output.amount() - 1)]);
        base.memo = vec![memo];
        self.sign(UnsignedTx::Import(ImportTx {
            base,
            source_chain: X_CHAIN,
            imported_inputs: vec![spend(utxo)],
        }))
    }
}

pub fn peer_utxo(tx: u8, amount: u64) -> Utxo {
    Utxo {
        utxo_id: UtxoId::new(Id::from_byte(tx), 0),
        asset_id: FEE_ASSET,
        output: transfer(amount).output,
    }
}
