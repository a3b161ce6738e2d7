//! # Test Network
//!
//! One physical store holding the platform chain's ledger and the shared
//! memory of every chain, a block manager over it, and helpers for the
//! transactions the scenarios need.

use parking_lot::Mutex;
use pc_01_keyed_store::MemoryStore;
use pc_02_shared_memory::{Element, Memory, Requests, SharedMemory};
use pc_03_staker_ledger::{Genesis, GenesisStaker, SharedState, State, StateConfig};
use pc_04_state_diff::DiffArena;
use pc_05_tx_executor::{
    Backend, BootstrapMode, ExecutorConfig, FeeConfig, ProofOfPossessionVerifier, RewardConfig,
    SecpFx, StakingConfig, UpgradeConfig,
};
use pc_06_block_executor::{
    Block, BlockBody, BlockManager, ChainCreator, ChainGuard, ChainLock, Clock, ManagerConfig,
    ManagerPorts, ManualClock, Uptime, UptimeError,
};
use shared_types::{
    AddPermissionlessValidatorTx, AddSubnetValidatorTx, AddValidatorTx, AssetId, BaseTx, BlockId,
    ChainId, Codec, CreateSubnetTx, Credential, ExportTx, Id, ImportTx, Input, NodeId, Output,
    OutputOwners, ProofOfPossession, RemoveSubnetValidatorTx, ShortId, Signer, SubnetAuth,
    SubnetId, TransferInput, TransferOutput, TransferableInput, TransferableOutput, Tx,
    UnsignedTx, Utxo, UtxoId, Validator, PRIMARY_NETWORK_ID,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const FEE_ASSET: AssetId = Id::from_byte(0xAA);
pub const P_CHAIN: ChainId = Id::from_byte(0xC0);
pub const X_CHAIN: ChainId = Id::from_byte(0xC1);
pub const GENESIS_BLOCK: BlockId = Id::from_byte(0x66);
pub const GENESIS_TIME: u64 = 1_000;
pub const GENESIS_END: u64 = GENESIS_TIME + 50_000;
pub const GENESIS_NODE: NodeId = NodeId::from_byte(1);
pub const OWNER: ShortId = ShortId::from_byte(1);
/// Funds the scenarios spend, one genesis UTXO per entry.
pub const FUNDED: [(u8, u64); 4] = [
    (1, 1_000_000),
    (2, 500_000),
    (3, 200_000),
    (4, 200_000),
];

pub struct NonZeroPop;

impl ProofOfPossessionVerifier for NonZeroPop {
    fn verify(&self, pop: &ProofOfPossession) -> bool {
        !pop.is_zero()
    }
}

/// Uptime oracle with a per-node observed fraction.
#[derive(Default)]
pub struct ObservedUptimes {
    uptimes: Mutex<HashMap<NodeId, f64>>,
}

impl ObservedUptimes {
    pub fn observe(&self, node_id: NodeId, uptime: f64) {
        self.uptimes.lock().insert(node_id, uptime);
    }
}

impl Uptime for ObservedUptimes {
    fn calculate_uptime_percent_from(
        &self,
        node_id: NodeId,
        _subnet_id: SubnetId,
        _start_time: u64,
    ) -> Result<f64, UptimeError> {
        self.uptimes
            .lock()
            .get(&node_id)
            .copied()
            .ok_or(UptimeError::NotTracked(node_id))
    }
}

#[derive(Default)]
pub struct QueuedChains {
    pub queued: Mutex<Vec<ChainId>>,
}

impl ChainCreator for QueuedChains {
    fn queue_chain_creation(&self, chain_id: ChainId, _subnet_id: SubnetId, _tx: &Tx) {
        self.queued.lock().push(chain_id);
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

pub fn utxo(tx: u8, amount: u64) -> Utxo {
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
        utxos: FUNDED.iter().map(|(tx, amount)| utxo(*tx, *amount)).collect(),
        validators: vec![GenesisStaker {
            tx: genesis_validator(codec),
            potential_reward: 0,
        }],
        chains: vec![],
    }
}

pub struct Network {
    pub store: Arc<MemoryStore>,
    pub codec: Arc<Codec>,
    pub memory: Arc<Memory>,
    pub state: SharedState,
    pub arena: Arc<DiffArena>,
    pub lock: ChainLock,
    pub clock: Arc<ManualClock>,
    pub uptimes: Arc<ObservedUptimes>,
    pub chains: Arc<QueuedChains>,
    pub manager: Arc<BlockManager>,
}

impl Network {
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    pub fn with_config(config: ManagerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let codec = Arc::new(Codec::default());
        let mut state = State::open(store.clone(), codec.clone(), StateConfig::default()).unwrap();
        state.initialize(genesis(&codec)).unwrap();
        Self::over(store, codec, state, config)
    }

    /// A node restarted on the store of `self`.
    pub fn restart(&self) -> Self {
        let state =
            State::open(self.store.clone(), self.codec.clone(), StateConfig::default()).unwrap();
        Self::over(
            self.store.clone(),
            self.codec.clone(),
            state,
            ManagerConfig::default(),
        )
    }

    fn over(store: Arc<MemoryStore>, codec: Arc<Codec>, state: State, config: ManagerConfig) -> Self {
        let memory = Memory::new(store.clone(), codec.clone());
        let backend = Backend::new(
            executor_config(),
            codec.clone(),
            Arc::new(SecpFx),
            Arc::new(NonZeroPop),
            Arc::new(memory.new_shared_memory(P_CHAIN)),
        );
        let last_accepted = state.last_accepted();
        let state = SharedState::new(state);
        let arena = Arc::new(DiffArena::new(state.clone(), last_accepted));

        let lock = ChainLock::new();
        let clock = Arc::new(ManualClock::new(GENESIS_TIME));
        let uptimes = Arc::new(ObservedUptimes::default());
        let chains = Arc::new(QueuedChains::default());
        let manager = Arc::new(BlockManager::new(
            lock.clone(),
            config,
            backend,
            arena.clone(),
            Arc::new(memory.new_shared_memory(P_CHAIN)),
            ManagerPorts {
                chain_creator: chains.clone(),
                uptimes: uptimes.clone(),
                clock: clock.clone(),
            },
        ));
        Self {
            store,
            codec,
            memory,
            state,
            arena,
            lock,
            clock,
            uptimes,
            chains,
            manager,
        }
    }

    pub fn x_chain(&self) -> SharedMemory {
        self.memory.new_shared_memory(X_CHAIN)
    }

    pub fn sign(&self, unsigned: UnsignedTx) -> Tx {
        Tx::new(unsigned, vec![cred()], &self.codec).unwrap()
    }

    /// Signs with one spend credential plus the subnet owner's credential.
    pub fn sign_with_auth(&self, unsigned: UnsignedTx) -> Tx {
        Tx::new(unsigned, vec![cred(), cred()], &self.codec).unwrap()
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

    /// Verifies and accepts `block`.
    pub fn decide(&self, guard: &ChainGuard<'_>, block: Block) {
        let block_id = block.id();
        self.manager.verify(guard, block).unwrap();
        self.manager.accept(guard, block_id).unwrap();
    }

    /// Builds a block from the mempool, verifies and accepts it.
    pub fn build_and_accept(&self, guard: &ChainGuard<'_>) -> Block {
        let block = self.manager.build_block(guard).unwrap();
        self.decide(guard, block.clone());
        block
    }

    pub fn export(&self, funding: &Utxo, amount: u64) -> Tx {
        let change = funding.output.amount() - amount - 1;
        self.sign(UnsignedTx::Export(ExportTx {
            base: base(vec![spend(funding)], vec![transfer(change)]),
            destination_chain: X_CHAIN,
            exported_outputs: vec![transfer(amount)],
        }))
    }

    pub fn import(&self, imported: &Utxo) -> Tx {
        self.sign(UnsignedTx::Import(ImportTx {
            base: base(vec![], vec![transfer(imported.output.amount() - 1)]),
            source_chain: X_CHAIN,
            imported_inputs: vec![spend(imported)],
        }))
    }

    /// Delivers `utxo` from the X-chain into the platform chain's inbound
    /// namespace, as an accepted X-chain export would.
    pub fn deliver_from_x(&self, utxo: &Utxo) {
        let element = Element {
            key: utxo.input_id().as_bytes().to_vec(),
            value: self.codec.marshal(utxo).unwrap(),
            traits: vec![OWNER.as_bytes().to_vec()],
        };
        self.x_chain()
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

    /// A subnet owned by [`OWNER`]. Its ID is the transaction's ID.
    pub fn create_subnet(&self, funding: &Utxo) -> Tx {
        self.sign(UnsignedTx::CreateSubnet(CreateSubnetTx {
            base: base(vec![spend(funding)], vec![transfer(funding.output.amount() - 5)]),
            owner: owners(),
        }))
    }

    /// A permissioned validator for `node` on `subnet_id`, starting now.
    pub fn subnet_validator(
        &self,
        funding: &Utxo,
        subnet_id: SubnetId,
        node: NodeId,
        weight: u64,
        duration: u64,
    ) -> Tx {
        let now = self.clock.now();
        self.sign_with_auth(UnsignedTx::AddSubnetValidator(AddSubnetValidatorTx {
            base: base(vec![spend(funding)], vec![transfer(funding.output.amount() - 1)]),
            validator: Validator {
                node_id: node,
                start: now,
                end: now + duration,
                weight,
            },
            subnet_id,
            subnet_auth: SubnetAuth {
                sig_indices: vec![0],
            },
        }))
    }

    pub fn remove_subnet_validator(&self, funding: &Utxo, subnet_id: SubnetId, node: NodeId) -> Tx {
        self.sign_with_auth(UnsignedTx::RemoveSubnetValidator(RemoveSubnetValidatorTx {
            base: base(vec![spend(funding)], vec![transfer(funding.output.amount() - 1)]),
            node_id: node,
            subnet_id,
            subnet_auth: SubnetAuth {
                sig_indices: vec![0],
            },
        }))
    }

    /// A primary-network validator for `node` staking `weight` out of
    /// `funding`, starting now.
    pub fn validator(&self, funding: &Utxo, node: NodeId, weight: u64, duration: u64) -> Tx {
        let now = self.clock.now();
        self.sign(UnsignedTx::AddPermissionlessValidator(
            AddPermissionlessValidatorTx {
                base: base(
                    vec![spend(funding)],
                    vec![transfer(funding.output.amount() - weight)],
                ),
                validator: Validator {
                    node_id: node,
                    start: now,
                    end: now + duration,
                    weight,
                },
                subnet_id: PRIMARY_NETWORK_ID,
                signer: Signer::ProofOfPossession(ProofOfPossession {
                    public_key: [node.0[0]; 48],
                    signature: [node.0[0]; 96],
                }),
                stake_outs: vec![transfer(weight)],
                validator_rewards_owner: owners(),
                delegator_rewards_owner: owners(),
                delegation_shares: 20_000,
            },
        ))
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
