//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub service_name: String,

    /// `EnvFilter` directives, e.g. `info,pc_06_block_executor=debug`
    pub log_level: String,

    pub json_logs: bool,

    /// Whether fmt output goes to stdout at all
    pub console_output: bool,

    /// Network identifier (mainnet, fuji, local)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "platform-chain".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            console_output: true,
            network: "local".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Reads `PC_SERVICE_NAME`, `PC_LOG_LEVEL` (falling back to `RUST_LOG`),
    /// `PC_JSON_LOGS`, `PC_CONSOLE_OUTPUT` and `PC_NETWORK`. JSON output is
    /// the default inside containers.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// [`TelemetryConfig::from_env`] with `level` as the filter when neither
    /// `PC_LOG_LEVEL` nor `RUST_LOG` is set.
    pub fn from_env_or_level(level: &str) -> Self {
        Self::from_lookup_or_level(|key| env::var(key).ok(), level)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::from_lookup_or_level(lookup, &Self::default().log_level)
    }

    fn from_lookup_or_level(lookup: impl Fn(&str) -> Option<String>, level: &str) -> Self {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("PC_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("PC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or_else(|| level.to_string()),
            json_logs: lookup("PC_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(is_container),
            console_output: lookup("PC_CONSOLE_OUTPUT")
                .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
                .unwrap_or(defaults.console_output),
            network: lookup("PC_NETWORK").unwrap_or(defaults.network),
        }
    }
}
