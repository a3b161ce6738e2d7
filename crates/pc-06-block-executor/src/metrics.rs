//! # Block Executor Metrics
//!
//! Prometheus metrics for block processing.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! pc-06-block-executor = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `pchain_blocks_verified_total` - Counter of verified blocks (by kind)
//! - `pchain_block_verify_failures_total` - Counter of blocks failing verification
//! - `pchain_blocks_accepted_total` - Counter of accepted blocks
//! - `pchain_blocks_rejected_total` - Counter of rejected blocks
//! - `pchain_accept_failures_total` - Counter of failed commits (fatal)
//! - `pchain_mempool_size` - Gauge of pooled transactions
//! - `pchain_processing_blocks` - Gauge of tracked blocks awaiting a decision

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Verified blocks, labeled by block kind
    pub static ref BLOCKS_VERIFIED: IntCounterVec = register_int_counter_vec!(
        "pchain_blocks_verified_total",
        "Total number of blocks verified",
        &["kind"]
    )
    .expect("Failed to create BLOCKS_VERIFIED metric");

    pub static ref VERIFY_FAILURES: IntCounter = register_int_counter!(
        "pchain_block_verify_failures_total",
        "Total number of blocks that failed verification"
    )
    .expect("Failed to create VERIFY_FAILURES metric");

    pub static ref BLOCKS_ACCEPTED: IntCounter = register_int_counter!(
        "pchain_blocks_accepted_total",
        "Total number of blocks accepted"
    )
    .expect("Failed to create BLOCKS_ACCEPTED metric");

    pub static ref BLOCKS_REJECTED: IntCounter = register_int_counter!(
        "pchain_blocks_rejected_total",
        "Total number of blocks rejected"
    )
    .expect("Failed to create BLOCKS_REJECTED metric");

    /// Commits that failed after consensus accepted the block
    pub static ref ACCEPT_FAILURES: IntCounter = register_int_counter!(
        "pchain_accept_failures_total",
        "Total number of accepted blocks that failed to commit"
    )
    .expect("Failed to create ACCEPT_FAILURES metric");

    pub static ref MEMPOOL_SIZE: IntGauge = register_int_gauge!(
        "pchain_mempool_size",
        "Number of transactions in the mempool"
    )
    .expect("Failed to create MEMPOOL_SIZE metric");

    pub static ref PROCESSING_BLOCKS: IntGauge = register_int_gauge!(
        "pchain_processing_blocks",
        "Number of tracked blocks awaiting a decision"
    )
    .expect("Failed to create PROCESSING_BLOCKS metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

#[cfg(feature = "metrics")]
pub fn record_block_verified(kind: &str) {
    BLOCKS_VERIFIED.with_label_values(&[kind]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_verify_failure() {
    VERIFY_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_accepted() {
    BLOCKS_ACCEPTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_block_rejected() {
    BLOCKS_REJECTED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_accept_failure() {
    ACCEPT_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn set_mempool_size(size: usize) {
    MEMPOOL_SIZE.set(size as i64);
}

#[cfg(feature = "metrics")]
pub fn set_processing_blocks(count: usize) {
    PROCESSING_BLOCKS.set(count as i64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_block_verified(_kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_verify_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_rejected() {}

#[cfg(not(feature = "metrics"))]
pub fn record_accept_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn set_mempool_size(_size: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_processing_blocks(_count: usize) {}
