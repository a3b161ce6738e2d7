//! # Staking Flows
//!
//! Validators joining through the mempool and blocks, and leaving through
//! reward proposals whose preferred option follows observed uptime, and
//! permissioned subnet validators replaced within one block.

#[cfg(test)]
mod tests {
    use crate::fixtures::{self, Network, GENESIS_NODE, GENESIS_TIME};
    use pc_03_staker_ledger::ChainReader;
    use pc_05_tx_executor::ExecutorError;
    use pc_06_block_executor::{BlockError, OptionKind};
    use shared_types::{BlockId, NodeId, Tx, TxId, UnsignedTx, PRIMARY_NETWORK_ID};
    use std::collections::BTreeMap;

    const NODE: NodeId = NodeId::from_byte(9);
    const DURATION: u64 = 1_000;

    /// Accepts a 5 000-weight validator for `NODE` ending at
    /// `GENESIS_TIME + DURATION`.
    fn staked(net: &Network) -> Tx {
        let guard = net.lock.lock();
        let tx = net.validator(&fixtures::utxo(1, 1_000_000), NODE, 5_000, DURATION);
        net.manager.add_tx(&guard, tx.clone()).unwrap();
        net.build_and_accept(&guard);
        tx
    }

    /// Builds and verifies the reward proposal for `staker` at its end time.
    fn reward_proposal(net: &Network, staker: TxId) -> BlockId {
        net.clock.set(GENESIS_TIME + DURATION);
        let guard = net.lock.lock();
        let block = net.manager.build_block(&guard).unwrap();
        assert!(matches!(
            block.proposal_tx().map(|tx| tx.unsigned()),
            Some(UnsignedTx::RewardValidator(body)) if body.tx_id == staker
        ));
        net.manager.verify(&guard, block.clone()).unwrap();
        block.id()
    }

    #[test]
    fn test_low_weight_validator_rejected_without_effects() {
        let net = Network::new();
        let guard = net.lock.lock();
        let funding = fixtures::utxo(1, 1_000_000);
        let tx = net.validator(&funding, NODE, 1_999, DURATION);

        match net.manager.add_tx(&guard, tx.clone()) {
            Err(BlockError::Tx { tx_id, source }) => {
                assert_eq!(tx_id, tx.id());
                assert_eq!(
                    source,
                    ExecutorError::WeightTooSmall {
                        weight: 1_999,
                        min: 2_000
                    }
                );
            }
            other => panic!("expected a weight rejection, got {other:?}"),
        }
        assert_eq!(net.manager.mempool_len(&guard).unwrap(), 0);

        let block = net.standard(GENESIS_TIME, vec![tx]);
        assert!(matches!(
            net.manager.verify(&guard, block),
            Err(BlockError::Tx { .. })
        ));

        let state = net.state.read();
        assert!(state
            .get_current_validator(PRIMARY_NETWORK_ID, NODE)
            .is_err());
        assert!(state.get_utxo(funding.input_id()).is_ok());
        assert_eq!(state.height(), 0);
    }

    #[test]
    fn test_block_verified_twice_applies_once() {
        let net = Network::new();
        let guard = net.lock.lock();
        let supply = net.state.read().current_supply(PRIMARY_NETWORK_ID).unwrap();
        let tx = net.validator(&fixtures::utxo(1, 1_000_000), NODE, 5_000, DURATION);
        let block = net.standard(GENESIS_TIME, vec![tx.clone()]);

        net.manager
            .verify_with_context(&guard, block.clone(), 1)
            .unwrap();
        net.manager
            .verify_with_context(&guard, block.clone(), 2)
            .unwrap();
        net.manager.accept(&guard, block.id()).unwrap();

        let state = net.state.read();
        let staker = state
            .get_current_validator(PRIMARY_NETWORK_ID, NODE)
            .unwrap();
        assert_eq!(staker.weight, 5_000);
        assert_eq!(
            state.current_validator_set(PRIMARY_NETWORK_ID),
            [(GENESIS_NODE, 2_000), (NODE, 5_000)].into_iter().collect()
        );
        assert_eq!(
            state.current_supply(PRIMARY_NETWORK_ID).unwrap(),
            supply + staker.potential_reward
        );

        let diffs = state
            .weight_diffs_at(PRIMARY_NETWORK_ID, block.height())
            .unwrap();
        assert_eq!(diffs.len(), 1);
        assert!(!diffs[&NODE].decrease);
        assert_eq!(diffs[&NODE].amount, 5_000);
    }

    #[test]
    fn test_half_uptime_prefers_abort_and_forfeits_reward() {
        let net = Network::new();
        let tx = staked(&net);
        let proposal = reward_proposal(&net, tx.id());
        net.uptimes.observe(NODE, 0.5);

        let guard = net.lock.lock();
        let [preferred, other] = net.manager.options(&guard, proposal).unwrap();
        assert_eq!(preferred.option_kind(), Some(OptionKind::Abort));
        net.manager.verify(&guard, preferred.clone()).unwrap();
        net.manager.verify(&guard, other.clone()).unwrap();
        net.manager.accept(&guard, proposal).unwrap();
        net.manager.accept(&guard, preferred.id()).unwrap();
        net.manager.reject(&guard, other.id()).unwrap();

        let state = net.state.read();
        assert!(state
            .get_current_validator(PRIMARY_NETWORK_ID, NODE)
            .is_err());
        assert!(state.get_reward_utxos(tx.id()).unwrap().is_empty());
        assert_eq!(
            state.get_utxo(tx.id().prefixed(1)).unwrap().output.amount(),
            5_000
        );
    }

    #[test]
    fn test_sixty_percent_uptime_prefers_commit_and_pays_reward() {
        let net = Network::new();
        let tx = staked(&net);
        let potential_reward = net
            .state
            .read()
            .get_current_validator(PRIMARY_NETWORK_ID, NODE)
            .unwrap()
            .potential_reward;
        assert!(potential_reward > 0);
        let proposal = reward_proposal(&net, tx.id());
        net.uptimes.observe(NODE, 0.6);

        let guard = net.lock.lock();
        let [preferred, other] = net.manager.options(&guard, proposal).unwrap();
        assert_eq!(preferred.option_kind(), Some(OptionKind::Commit));
        net.manager.verify(&guard, preferred.clone()).unwrap();
        net.manager.verify(&guard, other.clone()).unwrap();
        net.manager.accept(&guard, proposal).unwrap();
        net.manager.accept(&guard, preferred.id()).unwrap();
        net.manager.reject(&guard, other.id()).unwrap();
        assert_eq!(net.manager.processing_len(&guard).unwrap(), 0);

        let state = net.state.read();
        let rewards = state.get_reward_utxos(tx.id()).unwrap();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].output.amount(), potential_reward);
        assert_eq!(
            state.get_utxo(tx.id().prefixed(1)).unwrap().output.amount(),
            5_000
        );
        assert_eq!(
            state.current_validator_set(PRIMARY_NETWORK_ID),
            [(GENESIS_NODE, 2_000)].into_iter().collect()
        );
    }

    #[test]
    fn test_untracked_uptime_falls_back_to_commit() {
        let net = Network::new();
        let tx = staked(&net);
        let proposal = reward_proposal(&net, tx.id());
        let guard = net.lock.lock();
        let [preferred, _] = net.manager.options(&guard, proposal).unwrap();
        assert_eq!(preferred.option_kind(), Some(OptionKind::Commit));
    }

    #[test]
    fn test_subnet_validator_replaced_in_one_block_survives_restart() {
        let net = Network::new();
        let node = GENESIS_NODE;
        let (subnet_id, old, new, replace_height) = {
            let guard = net.lock.lock();
            let subnet = net.create_subnet(&fixtures::utxo(1, 1_000_000));
            net.decide(&guard, net.standard(GENESIS_TIME, vec![subnet.clone()]));
            let subnet_id = subnet.id();

            let old = net.subnet_validator(&fixtures::utxo(2, 500_000), subnet_id, node, 100, 1_000);
            net.decide(&guard, net.standard(GENESIS_TIME, vec![old.clone()]));

            let remove = net.remove_subnet_validator(&fixtures::utxo(3, 200_000), subnet_id, node);
            let new = net.subnet_validator(&fixtures::utxo(4, 200_000), subnet_id, node, 40, 2_000);
            let block = net.standard(GENESIS_TIME, vec![remove, new.clone()]);
            let height = block.height();
            net.decide(&guard, block);
            (subnet_id, old, new, height)
        };

        let check = |net: &Network| {
            let state = net.state.read();
            let staker = state.get_current_validator(subnet_id, node).unwrap();
            assert_eq!(staker.tx_id, new.id());
            assert_eq!(staker.weight, 40);
            let on_subnet: Vec<_> = state
                .current_stakers()
                .unwrap()
                .into_iter()
                .filter(|s| s.subnet_id == subnet_id)
                .map(|s| s.tx_id)
                .collect();
            assert_eq!(on_subnet, vec![new.id()]);

            let diffs = state.weight_diffs_at(subnet_id, replace_height).unwrap();
            assert!(diffs[&node].decrease);
            assert_eq!(diffs[&node].amount, 60);
            assert_eq!(
                state.validator_set_at(subnet_id, replace_height - 1).unwrap(),
                BTreeMap::from([(node, 100)])
            );
            assert_eq!(
                state.validator_set_at(subnet_id, replace_height).unwrap(),
                BTreeMap::from([(node, 40)])
            );
            assert!(state
                .validator_set_at(subnet_id, replace_height - 2)
                .unwrap()
                .is_empty());
        };
        check(&net);
        assert_ne!(old.id(), new.id());

        let restarted = net.restart();
        check(&restarted);
    }
}
