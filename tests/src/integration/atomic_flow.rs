//! # Atomic Flows
//!
//! Value moving between the platform chain and the X-chain through shared
//! memory. The ledger change of an accepted block and its shared-memory
//! requests land in the same write; nothing is visible to the peer before
//! acceptance.

#[cfg(test)]
mod tests {
    use crate::fixtures::{self, Network, OWNER, P_CHAIN, X_CHAIN};
    use node_telemetry::init_test_logging;
    use pc_02_shared_memory::Requests;
    use pc_03_staker_ledger::ChainReader;
    use pc_06_block_executor::BlockError;
    use shared_types::{TxStatus, Utxo, UtxoId};
    use std::collections::BTreeMap;

    fn exported_key(tx: &shared_types::Tx) -> Vec<u8> {
        // One change output precedes the exported one.
        tx.id().prefixed(1).as_bytes().to_vec()
    }

    #[test]
    fn test_export_visible_to_peer_only_after_accept() {
        init_test_logging();
        let net = Network::new();
        let guard = net.lock.lock();
        let funding = fixtures::utxo(2, 500_000);
        let export = net.export(&funding, 10);
        net.manager.add_tx(&guard, export.clone()).unwrap();

        let block = net.manager.build_block(&guard).unwrap();
        net.manager.verify(&guard, block.clone()).unwrap();
        let key = exported_key(&export);
        assert!(net.x_chain().get(P_CHAIN, &[key.clone()]).is_err());

        net.manager.accept(&guard, block.id()).unwrap();
        let values = net.x_chain().get(P_CHAIN, &[key]).unwrap();
        let exported: Utxo = net.codec.unmarshal(&values[0]).unwrap();
        assert_eq!(exported.output.amount(), 10);
        assert_eq!(exported.utxo_id, UtxoId::new(export.id(), 1));

        let page = net
            .x_chain()
            .get_indexed(P_CHAIN, &[OWNER.as_bytes().to_vec()], &[], &[], 10)
            .unwrap();
        assert_eq!(page.values, values);

        let state = net.state.read();
        assert!(state.get_utxo(funding.input_id()).is_err());
        assert_eq!(
            state
                .get_utxo(export.id().prefixed(0))
                .unwrap()
                .output
                .amount(),
            499_989
        );
        assert_eq!(state.get_tx(export.id()).unwrap().1, TxStatus::Committed);
    }

    #[test]
    fn test_import_consumes_inbound_element() {
        let net = Network::new();
        let incoming = fixtures::utxo(0x31, 10);
        net.deliver_from_x(&incoming);
        let guard = net.lock.lock();
        let import = net.import(&incoming);
        net.manager.add_tx(&guard, import.clone()).unwrap();
        net.build_and_accept(&guard);

        let own = net.memory.new_shared_memory(P_CHAIN);
        assert!(own
            .get(X_CHAIN, &[incoming.input_id().as_bytes().to_vec()])
            .is_err());
        assert_eq!(
            net.state
                .read()
                .get_utxo(import.id().prefixed(0))
                .unwrap()
                .output
                .amount(),
            9
        );

        // A second import of the same element no longer verifies.
        let again = net.sign(shared_types::UnsignedTx::Import(shared_types::ImportTx {
            base: fixtures::base(vec![], vec![fixtures::transfer(8)]),
            source_chain: X_CHAIN,
            imported_inputs: vec![fixtures::spend(&incoming)],
        }));
        assert!(matches!(
            net.manager.add_tx(&guard, again),
            Err(BlockError::Tx { .. })
        ));
    }

    #[test]
    fn test_export_round_trip_back_to_platform_chain() {
        let net = Network::new();
        let guard = net.lock.lock();
        let export = net.export(&fixtures::utxo(3, 200_000), 1_000);
        net.manager.add_tx(&guard, export.clone()).unwrap();
        net.build_and_accept(&guard);

        // The X-chain accepts an import of the value and a later export of
        // it back, in one shared-memory write.
        let key = exported_key(&export);
        let returned = fixtures::utxo(0x41, 900);
        let element = pc_02_shared_memory::Element {
            key: returned.input_id().as_bytes().to_vec(),
            value: net.codec.marshal(&returned).unwrap(),
            traits: vec![OWNER.as_bytes().to_vec()],
        };
        net.x_chain()
            .apply(
                &BTreeMap::from([(
                    P_CHAIN,
                    Requests {
                        remove_requests: vec![key.clone()],
                        put_requests: vec![element],
                    },
                )]),
                vec![],
            )
            .unwrap();
        assert!(net.x_chain().get(P_CHAIN, &[key]).is_err());

        let import = net.import(&returned);
        net.manager.add_tx(&guard, import.clone()).unwrap();
        net.build_and_accept(&guard);
        assert_eq!(
            net.state
                .read()
                .get_utxo(import.id().prefixed(0))
                .unwrap()
                .output
                .amount(),
            899
        );
    }

    #[test]
    fn test_rejected_export_never_reaches_peer() {
        let net = Network::new();
        let guard = net.lock.lock();
        let export = net.export(&fixtures::utxo(4, 200_000), 10);
        net.manager.add_tx(&guard, export.clone()).unwrap();
        let block = net.manager.build_block(&guard).unwrap();
        net.manager.verify(&guard, block.clone()).unwrap();
        net.manager.reject(&guard, block.id()).unwrap();

        assert!(net.x_chain().get(P_CHAIN, &[exported_key(&export)]).is_err());
        assert_eq!(net.manager.mempool_len(&guard).unwrap(), 1);

        // The requeued export goes out in the next block.
        net.build_and_accept(&guard);
        assert!(net.x_chain().get(P_CHAIN, &[exported_key(&export)]).is_ok());
    }
}
