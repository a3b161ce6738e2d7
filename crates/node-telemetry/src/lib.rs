//! # Node Telemetry
//!
//! Logging setup and metrics export shared by the platform-chain crates.
//!
//! The ledger crates only emit `tracing` events and register Prometheus
//! metrics on the default registry. This crate is what a host binary calls
//! once at startup to route those events and to serve the metrics.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use node_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PC_SERVICE_NAME` | `platform-chain` | Service name attached to logs |
//! | `PC_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `PC_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `PC_NETWORK` | `local` | Network name attached to logs |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging};
pub use metrics::encode_metrics;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{directives}': {reason}")]
    Filter { directives: String, reason: String },

    #[error("Failed to install global subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to encode metrics: {0}")]
    MetricsEncode(String),
}
