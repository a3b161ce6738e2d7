//! # Standard Executor
//!
//! Executes decision transactions against a mutable ledger view. Each
//! handler runs every check, including the spend check, before its first
//! write.

use super::effects::{AcceptEffect, TxEffects};
use crate::backend::Backend;
use crate::config::RewardConfig;
use crate::domain::{
    get_validator, staking_rules, verify_delegation_cap, verify_spend, verify_stake_asset,
    verify_weight, verify_window, verify_within, RewardCalculator,
};
use crate::errors::ExecutorError;
use pc_02_shared_memory::{Element, Requests};
use pc_03_staker_ledger::{Chain, ChainReader, Staker};
use shared_types::{
    AddDelegatorTx, AddPermissionlessDelegatorTx, AddPermissionlessValidatorTx,
    AddSubnetValidatorTx, AddValidatorTx, AssetId, BaseTx, CreateChainTx, CreateSubnetTx,
    Credential, ExportTx, ImportTx, ProofOfPossession, RemoveSubnetValidatorTx, Signer,
    StakerTxInfo, SubnetAuth, SubnetId, TransferableInput, TransferableOutput,
    TransformSubnetTx, Tx, TxId, TxStatus, UnsignedTx, Utxo, UtxoId, PRIMARY_NETWORK_ID,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub struct StandardTxExecutor<'a> {
    backend: &'a Backend,
}

impl<'a> StandardTxExecutor<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Verifies `tx` against `chain` and applies it.
    ///
    /// On error `chain` is left exactly as it was.
    pub fn execute(&self, chain: &mut dyn Chain, tx: &Tx) -> Result<TxEffects, ExecutorError> {
        let unsigned = tx.unsigned();
        unsigned.syntactic_verify(&self.backend.tx_context())?;

        let effects = match unsigned {
            UnsignedTx::AddValidator(body) => self.add_validator(chain, tx, body),
            UnsignedTx::AddSubnetValidator(body) => self.add_subnet_validator(chain, tx, body),
            UnsignedTx::AddDelegator(body) => self.add_delegator(chain, tx, body),
            UnsignedTx::AddPermissionlessValidator(body) => {
                self.add_permissionless_validator(chain, tx, body)
            }
            UnsignedTx::AddPermissionlessDelegator(body) => {
                self.add_permissionless_delegator(chain, tx, body)
            }
            UnsignedTx::RemoveSubnetValidator(body) => {
                self.remove_subnet_validator(chain, tx, body)
            }
            UnsignedTx::TransformSubnet(body) => self.transform_subnet(chain, tx, body),
            UnsignedTx::CreateSubnet(body) => self.create_subnet(chain, tx, body),
            UnsignedTx::CreateChain(body) => self.create_chain(chain, tx, body),
            UnsignedTx::Import(body) => self.import(chain, tx, body),
            UnsignedTx::Export(body) => self.export(chain, tx, body),
            UnsignedTx::AdvanceTime(_) | UnsignedTx::RewardValidator(_) => {
                Err(ExecutorError::WrongTxType {
                    executor: "standard",
                    tx: unsigned.name(),
                })
            }
        }?;

        debug!(tx_id = %tx.id(), kind = unsigned.name(), "Executed transaction");
        Ok(effects)
    }

    fn add_validator(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &AddValidatorTx,
    ) -> Result<TxEffects, ExecutorError> {
        let now = chain.timestamp();
        let config = &self.backend.config;
        if config.upgrades.is_durango_active(now) {
            return Err(ExecutorError::DisabledAfterDurango {
                tx: tx.unsigned().name(),
            });
        }
        let v = &body.validator;
        let rules = staking_rules(self.backend, &*chain, PRIMARY_NETWORK_ID)?;
        verify_stake_asset(&body.stake_outs, rules.asset_id)?;
        verify_weight(v.weight, rules.min_validator_stake, rules.max_validator_stake)?;
        verify_delegation_fee(body.delegation_shares, rules.min_delegation_fee)?;
        verify_window(self.backend, &rules, now, v.start, v.end)?;
        if get_validator(&*chain, PRIMARY_NETWORK_ID, v.node_id)?.is_some() {
            return Err(ExecutorError::DuplicateValidator {
                subnet_id: PRIMARY_NETWORK_ID,
                node_id: v.node_id,
            });
        }

        let (creds, _) = split_credentials(tx, body.base.ins.len(), false)?;
        let burned = self.fee(config.fees.add_primary_network_validator_fee);
        self.verify_base_spend(&*chain, &body.base, &body.stake_outs, creds, burned)?;
        let (staker, supply) = self.prepare_staker(&*chain, tx, None, now)?;

        consume_and_produce(chain, tx.id(), &body.base);
        insert_staker(chain, staker, supply);
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn add_subnet_validator(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &AddSubnetValidatorTx,
    ) -> Result<TxEffects, ExecutorError> {
        let now = chain.timestamp();
        let v = &body.validator;
        let (creds, auth) = split_credentials(tx, body.base.ins.len(), true)?;
        self.verify_subnet_auth(&*chain, body.subnet_id, &body.subnet_auth, auth)?;

        // Permissioned subnets share the primary network's duration bounds.
        let rules = staking_rules(self.backend, &*chain, PRIMARY_NETWORK_ID)?;
        let start = verify_window(self.backend, &rules, now, v.start, v.end)?;
        if get_validator(&*chain, body.subnet_id, v.node_id)?.is_some() {
            return Err(ExecutorError::DuplicateValidator {
                subnet_id: body.subnet_id,
                node_id: v.node_id,
            });
        }
        let primary = get_validator(&*chain, PRIMARY_NETWORK_ID, v.node_id)?.ok_or(
            ExecutorError::NotValidator {
                subnet_id: PRIMARY_NETWORK_ID,
                node_id: v.node_id,
            },
        )?;
        verify_within(&primary, start, v.end)?;

        let burned = self.fee(self.backend.config.fees.add_subnet_validator_fee);
        self.verify_base_spend(&*chain, &body.base, &[], creds, burned)?;
        let (staker, supply) = self.prepare_staker(&*chain, tx, None, now)?;

        consume_and_produce(chain, tx.id(), &body.base);
        insert_staker(chain, staker, supply);
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn add_delegator(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &AddDelegatorTx,
    ) -> Result<TxEffects, ExecutorError> {
        let now = chain.timestamp();
        let config = &self.backend.config;
        if config.upgrades.is_durango_active(now) {
            return Err(ExecutorError::DisabledAfterDurango {
                tx: tx.unsigned().name(),
            });
        }
        let v = &body.validator;
        let rules = staking_rules(self.backend, &*chain, PRIMARY_NETWORK_ID)?;
        verify_stake_asset(&body.stake_outs, rules.asset_id)?;
        verify_weight(v.weight, rules.min_delegator_stake, u64::MAX)?;
        let start = verify_window(self.backend, &rules, now, v.start, v.end)?;
        let validator = get_validator(&*chain, PRIMARY_NETWORK_ID, v.node_id)?.ok_or(
            ExecutorError::NotValidator {
                subnet_id: PRIMARY_NETWORK_ID,
                node_id: v.node_id,
            },
        )?;
        verify_within(&validator, start, v.end)?;
        verify_delegation_cap(&*chain, &rules, &validator, v.weight)?;

        let (creds, _) = split_credentials(tx, body.base.ins.len(), false)?;
        let burned = self.fee(config.fees.add_primary_network_delegator_fee);
        self.verify_base_spend(&*chain, &body.base, &body.stake_outs, creds, burned)?;
        let (staker, supply) = self.prepare_staker(&*chain, tx, None, now)?;

        consume_and_produce(chain, tx.id(), &body.base);
        insert_staker(chain, staker, supply);
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn add_permissionless_validator(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &AddPermissionlessValidatorTx,
    ) -> Result<TxEffects, ExecutorError> {
        let now = chain.timestamp();
        let v = &body.validator;
        let rules = staking_rules(self.backend, &*chain, body.subnet_id)?;
        verify_stake_asset(&body.stake_outs, rules.asset_id)?;
        verify_weight(v.weight, rules.min_validator_stake, rules.max_validator_stake)?;
        verify_delegation_fee(body.delegation_shares, rules.min_delegation_fee)?;
        let start = verify_window(self.backend, &rules, now, v.start, v.end)?;
        if get_validator(&*chain, body.subnet_id, v.node_id)?.is_some() {
            return Err(ExecutorError::DuplicateValidator {
                subnet_id: body.subnet_id,
                node_id: v.node_id,
            });
        }
        if body.subnet_id != PRIMARY_NETWORK_ID {
            let primary = get_validator(&*chain, PRIMARY_NETWORK_ID, v.node_id)?.ok_or(
                ExecutorError::NotValidator {
                    subnet_id: PRIMARY_NETWORK_ID,
                    node_id: v.node_id,
                },
            )?;
            verify_within(&primary, start, v.end)?;
        }
        if let Signer::ProofOfPossession(pop) = &body.signer {
            self.verify_proof_of_possession(tx, pop, now)?;
        }

        let fees = &self.backend.config.fees;
        let fee = if body.subnet_id == PRIMARY_NETWORK_ID {
            fees.add_primary_network_validator_fee
        } else {
            fees.add_subnet_validator_fee
        };
        let (creds, _) = split_credentials(tx, body.base.ins.len(), false)?;
        self.verify_base_spend(&*chain, &body.base, &body.stake_outs, creds, self.fee(fee))?;
        let (staker, supply) = self.prepare_staker(&*chain, tx, Some(&rules.reward), now)?;

        consume_and_produce(chain, tx.id(), &body.base);
        insert_staker(chain, staker, supply);
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn add_permissionless_delegator(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &AddPermissionlessDelegatorTx,
    ) -> Result<TxEffects, ExecutorError> {
        let now = chain.timestamp();
        let v = &body.validator;
        let rules = staking_rules(self.backend, &*chain, body.subnet_id)?;
        verify_stake_asset(&body.stake_outs, rules.asset_id)?;
        verify_weight(v.weight, rules.min_delegator_stake, u64::MAX)?;
        let start = verify_window(self.backend, &rules, now, v.start, v.end)?;
        let validator = get_validator(&*chain, body.subnet_id, v.node_id)?.ok_or(
            ExecutorError::NotValidator {
                subnet_id: body.subnet_id,
                node_id: v.node_id,
            },
        )?;
        verify_within(&validator, start, v.end)?;
        verify_delegation_cap(&*chain, &rules, &validator, v.weight)?;

        let fees = &self.backend.config.fees;
        let fee = if body.subnet_id == PRIMARY_NETWORK_ID {
            fees.add_primary_network_delegator_fee
        } else {
            fees.add_subnet_delegator_fee
        };
        let (creds, _) = split_credentials(tx, body.base.ins.len(), false)?;
        self.verify_base_spend(&*chain, &body.base, &body.stake_outs, creds, self.fee(fee))?;
        let (staker, supply) = self.prepare_staker(&*chain, tx, Some(&rules.reward), now)?;

        consume_and_produce(chain, tx.id(), &body.base);
        insert_staker(chain, staker, supply);
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn remove_subnet_validator(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &RemoveSubnetValidatorTx,
    ) -> Result<TxEffects, ExecutorError> {
        let (creds, auth) = split_credentials(tx, body.base.ins.len(), true)?;
        self.verify_subnet_auth(&*chain, body.subnet_id, &body.subnet_auth, auth)?;

        let not_validator = || ExecutorError::NotValidator {
            subnet_id: body.subnet_id,
            node_id: body.node_id,
        };
        let (staker, is_current) = match chain.get_current_validator(body.subnet_id, body.node_id)
        {
            Ok(staker) => (staker, true),
            Err(e) if e.is_not_found() => {
                match chain.get_pending_validator(body.subnet_id, body.node_id) {
                    Ok(staker) => (staker, false),
                    Err(e) if e.is_not_found() => return Err(not_validator()),
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };
        if !staker.priority.is_permissioned_validator() {
            return Err(ExecutorError::NotPermissionedValidator {
                subnet_id: body.subnet_id,
                node_id: body.node_id,
            });
        }

        let burned = self.fee(self.backend.config.fees.tx_fee);
        self.verify_base_spend(&*chain, &body.base, &[], creds, burned)?;

        consume_and_produce(chain, tx.id(), &body.base);
        if is_current {
            chain.delete_current_validator(&staker);
        } else {
            chain.delete_pending_validator(&staker);
        }
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn transform_subnet(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &TransformSubnetTx,
    ) -> Result<TxEffects, ExecutorError> {
        let config = &self.backend.config;
        let (creds, auth) = split_credentials(tx, body.base.ins.len(), true)?;
        self.verify_subnet_auth(&*chain, body.subnet_id, &body.subnet_auth, auth)?;
        if body.asset_id == config.fee_asset_id {
            return Err(ExecutorError::TransformWithFeeAsset);
        }
        if body.max_stake_duration > config.staking.max_stake_duration {
            return Err(ExecutorError::DurationTooLong {
                duration: body.max_stake_duration,
                max: config.staking.max_stake_duration,
            });
        }

        // The not-yet-minted part of the subnet's supply is locked up front.
        let mut burned = self.fee(config.fees.transform_subnet_tx_fee);
        let locked = body.maximum_supply - body.initial_supply;
        if locked > 0 {
            burned.insert(body.asset_id, locked);
        }
        self.verify_base_spend(&*chain, &body.base, &[], creds, burned)?;

        consume_and_produce(chain, tx.id(), &body.base);
        chain.add_subnet_transformation(body.subnet_id, tx.clone());
        chain.set_current_supply(body.subnet_id, body.initial_supply);
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn create_subnet(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &CreateSubnetTx,
    ) -> Result<TxEffects, ExecutorError> {
        let (creds, _) = split_credentials(tx, body.base.ins.len(), false)?;
        let burned = self.fee(self.backend.config.fees.create_subnet_tx_fee);
        self.verify_base_spend(&*chain, &body.base, &[], creds, burned)?;

        consume_and_produce(chain, tx.id(), &body.base);
        chain.set_subnet_owner(tx.id(), body.owner.clone());
        chain.add_tx(tx.clone(), TxStatus::Committed);
        Ok(base_effects(tx))
    }

    fn create_chain(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &CreateChainTx,
    ) -> Result<TxEffects, ExecutorError> {
        let (creds, auth) = split_credentials(tx, body.base.ins.len(), true)?;
        self.verify_subnet_auth(&*chain, body.subnet_id, &body.subnet_auth, auth)?;
        let burned = self.fee(self.backend.config.fees.create_blockchain_tx_fee);
        self.verify_base_spend(&*chain, &body.base, &[], creds, burned)?;

        consume_and_produce(chain, tx.id(), &body.base);
        chain.add_chain(body.subnet_id, tx.clone());
        chain.add_tx(tx.clone(), TxStatus::Committed);

        let mut effects = base_effects(tx);
        effects.on_accept.push(AcceptEffect::CreateChain {
            chain_id: tx.id(),
            subnet_id: body.subnet_id,
            tx: tx.clone(),
        });
        Ok(effects)
    }

    fn import(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &ImportTx,
    ) -> Result<TxEffects, ExecutorError> {
        if body.source_chain == self.backend.config.chain_id {
            return Err(ExecutorError::SameChainAtomic(body.source_chain));
        }
        let now = chain.timestamp();
        let input_count = body.base.ins.len() + body.imported_inputs.len();
        let (creds, _) = split_credentials(tx, input_count, false)?;

        let mut utxos = fetch_utxos(&*chain, &body.base.ins)?;
        let keys: Vec<Vec<u8>> = body
            .imported_inputs
            .iter()
            .map(|input| input.input_id().as_bytes().to_vec())
            .collect();
        let values = self.backend.atomic_utxos.get(body.source_chain, &keys)?;
        for (input, bytes) in body.imported_inputs.iter().zip(values) {
            let utxo: Utxo = self.backend.codec.unmarshal(&bytes)?;
            let requested = input.input_id();
            if utxo.input_id() != requested {
                return Err(ExecutorError::ImportedUtxoMismatch {
                    requested,
                    actual: utxo.input_id(),
                });
            }
            utxos.push(utxo);
        }
        let ins: Vec<TransferableInput> = body
            .base
            .ins
            .iter()
            .chain(&body.imported_inputs)
            .cloned()
            .collect();
        verify_spend(
            self.backend.fx.as_ref(),
            &utxos,
            &ins,
            &body.base.outs,
            creds,
            now,
            self.fee(self.backend.config.fees.tx_fee),
        )?;

        consume_and_produce(chain, tx.id(), &body.base);
        chain.add_tx(tx.clone(), TxStatus::Committed);

        let mut effects = base_effects(tx);
        effects.atomic_requests.insert(
            body.source_chain,
            Requests {
                remove_requests: keys,
                put_requests: vec![],
            },
        );
        Ok(effects)
    }

    fn export(
        &self,
        chain: &mut dyn Chain,
        tx: &Tx,
        body: &ExportTx,
    ) -> Result<TxEffects, ExecutorError> {
        if body.destination_chain == self.backend.config.chain_id {
            return Err(ExecutorError::SameChainAtomic(body.destination_chain));
        }
        let (creds, _) = split_credentials(tx, body.base.ins.len(), false)?;
        let burned = self.fee(self.backend.config.fees.tx_fee);
        self.verify_base_spend(&*chain, &body.base, &body.exported_outputs, creds, burned)?;

        // Exported outputs are indexed after the local ones.
        let offset = body.base.outs.len();
        let mut elements = Vec::with_capacity(body.exported_outputs.len());
        for (i, out) in body.exported_outputs.iter().enumerate() {
            let utxo = Utxo {
                utxo_id: UtxoId::new(tx.id(), (offset + i) as u32),
                asset_id: out.asset_id,
                output: out.output.clone(),
            };
            elements.push(Element {
                key: utxo.input_id().as_bytes().to_vec(),
                value: self.backend.codec.marshal(&utxo)?,
                traits: out
                    .output
                    .owners()
                    .addresses
                    .iter()
                    .map(|addr| addr.as_bytes().to_vec())
                    .collect(),
            });
        }

        consume_and_produce(chain, tx.id(), &body.base);
        chain.add_tx(tx.clone(), TxStatus::Committed);

        let mut effects = base_effects(tx);
        effects.atomic_requests.insert(
            body.destination_chain,
            Requests {
                remove_requests: vec![],
                put_requests: elements,
            },
        );
        Ok(effects)
    }

    fn fee(&self, amount: u64) -> BTreeMap<AssetId, u64> {
        let mut burned = BTreeMap::new();
        if amount > 0 {
            burned.insert(self.backend.config.fee_asset_id, amount);
        }
        burned
    }

    fn verify_base_spend<R: ChainReader + ?Sized>(
        &self,
        chain: &R,
        base: &BaseTx,
        extra_outs: &[TransferableOutput],
        creds: &[Credential],
        burned: BTreeMap<AssetId, u64>,
    ) -> Result<(), ExecutorError> {
        let utxos = fetch_utxos(chain, &base.ins)?;
        let outs: Vec<TransferableOutput> =
            base.outs.iter().chain(extra_outs).cloned().collect();
        verify_spend(
            self.backend.fx.as_ref(),
            &utxos,
            &base.ins,
            &outs,
            creds,
            chain.timestamp(),
            burned,
        )
    }

    /// Owner authorization for a permissioned subnet.
    fn verify_subnet_auth<R: ChainReader + ?Sized>(
        &self,
        chain: &R,
        subnet_id: SubnetId,
        auth: &SubnetAuth,
        credential: Option<&Credential>,
    ) -> Result<(), ExecutorError> {
        match chain.get_subnet_transformation(subnet_id) {
            Ok(_) => return Err(ExecutorError::SubnetTransformed(subnet_id)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        let owner = chain.get_subnet_owner(subnet_id)?;
        let credential = credential.ok_or(ExecutorError::CredentialCount {
            expected: 1,
            actual: 0,
        })?;
        self.backend.fx.verify_permission(
            &owner,
            &auth.sig_indices,
            credential,
            chain.timestamp(),
        )?;
        Ok(())
    }

    fn verify_proof_of_possession(
        &self,
        tx: &Tx,
        pop: &ProofOfPossession,
        now: u64,
    ) -> Result<(), ExecutorError> {
        if pop.is_zero() {
            if self.backend.config.bootstrap.allows_zero_pop(now) {
                warn!(tx_id = %tx.id(), now, "Accepting all-zero proof of possession while bootstrapping");
                return Ok(());
            }
            return Err(ExecutorError::InvalidProofOfPossession);
        }
        if !self.backend.pop_verifier.verify(pop) {
            return Err(ExecutorError::InvalidProofOfPossession);
        }
        Ok(())
    }

    /// Builds the staker `tx` creates, with the subnet's new supply when a
    /// reward is promised immediately.
    ///
    /// After Durango stakers go straight to the current set; `reward` is
    /// `None` for stakers that earn nothing.
    fn prepare_staker<R: ChainReader + ?Sized>(
        &self,
        chain: &R,
        tx: &Tx,
        reward: Option<&RewardConfig>,
        now: u64,
    ) -> Result<(Staker, Option<u64>), ExecutorError> {
        let info = staker_info(tx)?;
        if !self.backend.config.upgrades.is_durango_active(now) {
            return Ok((Staker::new_pending(tx.id(), &info), None));
        }
        let Some(reward_config) = reward else {
            return Ok((Staker::new_current(tx.id(), &info, now, 0), None));
        };
        let supply = chain.current_supply(info.subnet_id)?;
        let potential_reward = RewardCalculator::new(*reward_config).calculate(
            info.end_time.saturating_sub(now),
            info.weight,
            supply,
        );
        let supply = supply
            .checked_add(potential_reward)
            .ok_or(ExecutorError::Overflow)?;
        Ok((
            Staker::new_current(tx.id(), &info, now, potential_reward),
            Some(supply),
        ))
    }
}

fn staker_info(tx: &Tx) -> Result<StakerTxInfo, ExecutorError> {
    tx.unsigned()
        .staker()
        .ok_or(ExecutorError::NotStakerTx(tx.id()))
}

fn verify_delegation_fee(shares: u32, min: u32) -> Result<(), ExecutorError> {
    if shares < min {
        return Err(ExecutorError::DelegationFeeTooLow { shares, min });
    }
    Ok(())
}

/// Spend credentials first, then the subnet-auth credential if any.
fn split_credentials(
    tx: &Tx,
    inputs: usize,
    with_auth: bool,
) -> Result<(&[Credential], Option<&Credential>), ExecutorError> {
    let creds = tx.credentials();
    let expected = inputs + usize::from(with_auth);
    if creds.len() != expected {
        return Err(ExecutorError::CredentialCount {
            expected,
            actual: creds.len(),
        });
    }
    let (spend, auth) = creds.split_at(inputs);
    Ok((spend, auth.first()))
}

fn fetch_utxos<R: ChainReader + ?Sized>(
    chain: &R,
    ins: &[TransferableInput],
) -> Result<Vec<Utxo>, ExecutorError> {
    ins.iter()
        .map(|input| chain.get_utxo(input.input_id()).map_err(ExecutorError::from))
        .collect()
}

fn consume_and_produce(chain: &mut dyn Chain, tx_id: TxId, base: &BaseTx) {
    for input in &base.ins {
        chain.delete_utxo(input.input_id());
    }
    for (i, out) in base.outs.iter().enumerate() {
        chain.add_utxo(Utxo {
            utxo_id: UtxoId::new(tx_id, i as u32),
            asset_id: out.asset_id,
            output: out.output.clone(),
        });
    }
}

fn insert_staker(chain: &mut dyn Chain, staker: Staker, supply: Option<u64>) {
    if let Some(supply) = supply {
        chain.set_current_supply(staker.subnet_id, supply);
    }
    match (staker.priority.is_current(), staker.is_validator()) {
        (true, true) => chain.put_current_validator(staker),
        (true, false) => chain.put_current_delegator(staker),
        (false, true) => chain.put_pending_validator(staker),
        (false, false) => chain.put_pending_delegator(staker),
    }
}

fn base_effects(tx: &Tx) -> TxEffects {
    TxEffects {
        inputs: tx.unsigned().input_ids().into_iter().collect(),
        ..TxEffects::default()
    }
}
