//! # Platform-Chain Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | pc-02 Shared Memory | one atomic `apply` of N puts |
//! | pc-06 Block Executor | verifying a standard block against a fresh diff |
//! | pc-03 Staker Ledger | validator set at a past height |

use criterion::{black_box, criterion_group, BatchSize, BenchmarkId, Criterion, Throughput};
use node_telemetry::{encode_metrics, init_logging, TelemetryConfig};
use pc_01_keyed_store::MemoryStore;
use pc_02_shared_memory::{Element, Memory, Requests};
use pc_tests::fixtures::{self, Network, GENESIS_TIME, OWNER, P_CHAIN, X_CHAIN};
use rand::Rng;
use shared_types::{Codec, NodeId, PRIMARY_NETWORK_ID};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// PC-02: Shared Memory
// ============================================================================

fn bench_shared_memory_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-02-shared-memory");
    let mut rng = rand::thread_rng();

    for size in [10usize, 100, 1_000] {
        let elements: Vec<Element> = (0..size)
            .map(|_| Element {
                key: rng.gen::<[u8; 32]>().to_vec(),
                value: rng.gen::<[u8; 32]>().to_vec(),
                traits: vec![OWNER.as_bytes().to_vec()],
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("apply_puts", size), &elements, |b, elements| {
            b.iter_batched(
                || {
                    let memory = Memory::new(
                        Arc::new(MemoryStore::new()),
                        Arc::new(Codec::default()),
                    );
                    let requests = BTreeMap::from([(
                        X_CHAIN,
                        Requests {
                            remove_requests: vec![],
                            put_requests: elements.clone(),
                        },
                    )]);
                    (memory, requests)
                },
                |(memory, requests)| {
                    memory
                        .new_shared_memory(P_CHAIN)
                        .apply(&requests, vec![])
                        .unwrap()
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// ============================================================================
// PC-06: Block Verification
// ============================================================================

fn bench_block_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-06-block-executor");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("verify_export_block", |b| {
        b.iter_batched(
            || {
                let net = Network::new();
                let export = net.export(&fixtures::utxo(2, 500_000), 10);
                let block = net.standard(GENESIS_TIME, vec![export]);
                (net, block)
            },
            |(net, block)| {
                let guard = net.lock.lock();
                net.manager.verify(&guard, block).unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("verify_validator_block", |b| {
        b.iter_batched(
            || {
                let net = Network::new();
                let tx = net.validator(
                    &fixtures::utxo(1, 1_000_000),
                    NodeId::from_byte(9),
                    5_000,
                    1_000,
                );
                let block = net.standard(GENESIS_TIME, vec![tx]);
                (net, block)
            },
            |(net, block)| {
                let guard = net.lock.lock();
                net.manager.verify(&guard, block).unwrap();
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

// ============================================================================
// PC-03: Validator Set History
// ============================================================================

fn bench_validator_set_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("pc-03-staker-ledger");

    // One validator joins per block.
    let net = Network::new();
    {
        let guard = net.lock.lock();
        let mut funding = fixtures::utxo(1, 1_000_000);
        for i in 0..32u8 {
            let tx = net.validator(&funding, NodeId::from_byte(10 + i), 2_000, 1_000);
            funding = shared_types::Utxo {
                utxo_id: shared_types::UtxoId::new(tx.id(), 0),
                asset_id: fixtures::FEE_ASSET,
                output: fixtures::transfer(funding.output.amount() - 2_000).output,
            };
            net.decide(&guard, net.standard(GENESIS_TIME, vec![tx]));
        }
    }

    let state = net.state.read();
    for height in [31u64, 16, 0] {
        group.bench_with_input(
            BenchmarkId::new("validator_set_at", height),
            &height,
            |b, &height| {
                b.iter(|| {
                    black_box(
                        state
                            .validator_set_at(PRIMARY_NETWORK_ID, height)
                            .unwrap(),
                    )
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_shared_memory_apply,
    bench_block_verify,
    bench_validator_set_at,
);

fn main() {
    // Block acceptance logs at info; keep measurements quiet unless asked.
    if let Err(e) = init_logging(&TelemetryConfig::from_env_or_level("warn")) {
        eprintln!("logging not initialized: {e}");
    }

    benches();
    Criterion::default().configure_from_args().final_summary();

    match encode_metrics() {
        Ok(text) if !text.is_empty() => println!("{text}"),
        Ok(_) => {}
        Err(e) => eprintln!("metrics not exported: {e}"),
    }
}
