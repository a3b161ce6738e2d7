use crate::config::ExecutorConfig;
use crate::domain::RewardCalculator;
use crate::ports::{AtomicUtxos, Fx, ProofOfPossessionVerifier};
use shared_types::{Codec, TxContext};
use std::sync::Arc;

/// Configuration and collaborators every executor needs.
#[derive(Clone)]
pub struct Backend {
    pub config: Arc<ExecutorConfig>,
    pub codec: Arc<Codec>,
    pub fx: Arc<dyn Fx>,
    pub pop_verifier: Arc<dyn ProofOfPossessionVerifier>,
    pub atomic_utxos: Arc<dyn AtomicUtxos>,
    pub rewards: RewardCalculator,
}

impl Backend {
    pub fn new(
        config: ExecutorConfig,
        codec: Arc<Codec>,
        fx: Arc<dyn Fx>,
        pop_verifier: Arc<dyn ProofOfPossessionVerifier>,
        atomic_utxos: Arc<dyn AtomicUtxos>,
    ) -> Self {
        let rewards = RewardCalculator::new(config.staking.reward);
        Self {
            config: Arc::new(config),
            codec,
            fx,
            pop_verifier,
            atomic_utxos,
            rewards,
        }
    }

    pub fn tx_context(&self) -> TxContext {
        self.config.tx_context()
    }
}
