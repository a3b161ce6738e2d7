//! # Ledger History
//!
//! Validator-set history reconstructed from weight diffs, state surviving a
//! restart on the same store, and sibling candidate blocks seeing only their
//! own changes.

#[cfg(test)]
mod tests {
    use crate::fixtures::{self, Network, FEE_ASSET, GENESIS_TIME};
    use pc_03_staker_ledger::ChainReader;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{NodeId, Tx, Utxo, UtxoId, PRIMARY_NETWORK_ID};
    use std::collections::BTreeMap;

    /// The change output a validator transaction leaves at index 0.
    fn change_of(tx: &Tx, amount: u64) -> Utxo {
        Utxo {
            utxo_id: UtxoId::new(tx.id(), 0),
            asset_id: FEE_ASSET,
            output: fixtures::transfer(amount).output,
        }
    }

    #[test]
    fn test_validator_set_at_matches_snapshots() {
        let net = Network::new();
        let guard = net.lock.lock();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut snapshots = vec![net.state.read().current_validator_set(PRIMARY_NETWORK_ID)];
        let mut weights = BTreeMap::new();

        let mut funding = fixtures::utxo(1, 1_000_000);
        for i in 0..8u8 {
            let node = NodeId::from_byte(10 + i);
            let weight = rng.gen_range(2_000..=20_000);
            let duration = rng.gen_range(200..=5_000);
            let tx = net.validator(&funding, node, weight, duration);
            funding = change_of(&tx, funding.output.amount() - weight);
            weights.insert(node, weight);

            net.decide(&guard, net.standard(GENESIS_TIME, vec![tx]));
            snapshots.push(net.state.read().current_validator_set(PRIMARY_NETWORK_ID));
        }

        // The first staker to leave goes through a proposal and its option.
        let first_end = net
            .state
            .read()
            .current_stakers()
            .unwrap()
            .iter()
            .map(|staker| staker.end_time)
            .min()
            .unwrap();
        net.clock.set(first_end);
        let proposal = net.manager.build_block(&guard).unwrap();
        net.manager.verify(&guard, proposal.clone()).unwrap();
        let [preferred, other] = net.manager.options(&guard, proposal.id()).unwrap();
        net.manager.verify(&guard, preferred.clone()).unwrap();
        net.manager.verify(&guard, other.clone()).unwrap();
        net.manager.accept(&guard, proposal.id()).unwrap();
        snapshots.push(net.state.read().current_validator_set(PRIMARY_NETWORK_ID));
        net.manager.accept(&guard, preferred.id()).unwrap();
        net.manager.reject(&guard, other.id()).unwrap();
        snapshots.push(net.state.read().current_validator_set(PRIMARY_NETWORK_ID));

        let state = net.state.read();
        assert_eq!(state.height(), snapshots.len() as u64 - 1);
        assert_eq!(snapshots[10].len() + 1, snapshots[9].len());
        for (height, snapshot) in snapshots.iter().enumerate() {
            assert_eq!(
                &state
                    .validator_set_at(PRIMARY_NETWORK_ID, height as u64)
                    .unwrap(),
                snapshot,
                "validator set at height {height}"
            );
        }
        for (node, weight) in weights {
            let diff = state
                .weight_diff_between(PRIMARY_NETWORK_ID, node, 0, 8)
                .unwrap();
            assert!(!diff.decrease);
            assert_eq!(diff.amount, weight);
        }
        assert!(state
            .validator_set_at(PRIMARY_NETWORK_ID, state.height() + 1)
            .is_err());
    }

    #[test]
    fn test_restart_resumes_from_committed_state() {
        let net = Network::new();
        let node = NodeId::from_byte(9);
        let tx = {
            let guard = net.lock.lock();
            let tx = net.validator(&fixtures::utxo(1, 1_000_000), node, 5_000, 1_000);
            net.decide(&guard, net.standard(GENESIS_TIME, vec![tx.clone()]));
            tx
        };
        let (last_accepted, height, supply) = {
            let state = net.state.read();
            (
                state.last_accepted(),
                state.height(),
                state.current_supply(PRIMARY_NETWORK_ID).unwrap(),
            )
        };

        let restarted = net.restart();
        {
            let state = restarted.state.read();
            assert_eq!(state.last_accepted(), last_accepted);
            assert_eq!(state.height(), height);
            assert_eq!(state.timestamp(), GENESIS_TIME);
            assert_eq!(state.current_supply(PRIMARY_NETWORK_ID).unwrap(), supply);
            assert_eq!(
                state.get_utxo(tx.id().prefixed(0)).unwrap().output.amount(),
                995_000
            );
            assert_eq!(
                state
                    .get_current_validator(PRIMARY_NETWORK_ID, node)
                    .unwrap()
                    .weight,
                5_000
            );
        }

        let guard = restarted.lock.lock();
        let export = restarted.export(&fixtures::utxo(2, 500_000), 10);
        let child = restarted.standard(GENESIS_TIME, vec![export]);
        assert_eq!(child.parent_id(), last_accepted);
        restarted.decide(&guard, child.clone());
        assert_eq!(restarted.state.read().height(), height + 1);
        assert_eq!(restarted.state.read().last_accepted(), child.id());
    }

    #[test]
    fn test_sibling_blocks_see_only_their_own_changes() {
        let net = Network::new();
        let guard = net.lock.lock();
        let node = NodeId::from_byte(9);
        let a = net.standard(
            GENESIS_TIME,
            vec![net.validator(&fixtures::utxo(1, 1_000_000), node, 3_000, 1_000)],
        );
        let b = net.standard(
            GENESIS_TIME,
            vec![net.validator(&fixtures::utxo(2, 500_000), node, 4_000, 1_000)],
        );
        net.manager.verify(&guard, a.clone()).unwrap();
        net.manager.verify(&guard, b.clone()).unwrap();

        let weight_in = |block_id| {
            net.arena
                .get(block_id)
                .unwrap()
                .get_current_validator(PRIMARY_NETWORK_ID, node)
                .unwrap()
                .weight
        };
        assert_eq!(weight_in(a.id()), 3_000);
        assert_eq!(weight_in(b.id()), 4_000);
        assert!(net
            .state
            .read()
            .get_current_validator(PRIMARY_NETWORK_ID, node)
            .is_err());

        net.manager.reject(&guard, a.id()).unwrap();
        assert!(!net.arena.contains(a.id()));
        assert_eq!(weight_in(b.id()), 4_000);

        net.manager.accept(&guard, b.id()).unwrap();
        assert_eq!(net.manager.status(&guard, a.id()).unwrap(), None);
        let state = net.state.read();
        assert_eq!(
            state
                .get_current_validator(PRIMARY_NETWORK_ID, node)
                .unwrap()
                .weight,
            4_000
        );
        assert!(state.get_utxo(fixtures::utxo(1, 1_000_000).input_id()).is_ok());
    }
}
