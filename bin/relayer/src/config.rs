//! TOML configuration for the relayer daemon.

use std::path::PathBuf;

use serde::Deserialize;
use tbtc_relayer_primitives::ChainFamily;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StoreConfig {
    /// Directory for the sled record store.
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HttpConfig {
    pub host: String,
    pub port: u16,
}

fn default_clean_queued_hours() -> u64 {
    48
}

fn default_clean_finalized_hours() -> u64 {
    12
}

fn default_clean_bridged_hours() -> u64 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CleanupConfig {
    #[serde(default = "default_clean_queued_hours")]
    pub clean_queued_hours: u64,
    #[serde(default = "default_clean_finalized_hours")]
    pub clean_finalized_hours: u64,
    #[serde(default = "default_clean_bridged_hours")]
    pub clean_bridged_hours: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            clean_queued_hours: default_clean_queued_hours(),
            clean_finalized_hours: default_clean_finalized_hours(),
            clean_bridged_hours: default_clean_bridged_hours(),
        }
    }
}

fn default_vaa_max_retries() -> u32 {
    5
}

fn default_vaa_retry_delay_ms() -> u64 {
    60_000
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VaaConfig {
    #[serde(default = "default_vaa_max_retries")]
    pub fetch_max_retries: u32,
    #[serde(default = "default_vaa_retry_delay_ms")]
    pub fetch_retry_delay_ms: u64,
    /// VAA retrieval attempts before a redemption is marked failed.
    /// Zero retries indefinitely.
    #[serde(default)]
    pub max_attempts_before_failed: u32,
}

impl Default for VaaConfig {
    fn default() -> Self {
        Self {
            fetch_max_retries: default_vaa_max_retries(),
            fetch_retry_delay_ms: default_vaa_retry_delay_ms(),
            max_attempts_before_failed: 0,
        }
    }
}

/// One destination chain block.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChainConfig {
    pub name: String,
    pub family: ChainFamily,
    pub rpc_url: String,
    pub contract_address: String,
    #[serde(default = "default_confirmations")]
    pub confirmations: u32,
    pub wormhole_chain_id: u16,
    pub emitter_address: String,
}

fn default_confirmations() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Config {
    pub store: StoreConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub vaa: VaaConfig,
    pub chains: Vec<ChainConfig>,
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("could not read config {path}: {e}"))?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("could not parse config {path}: {e}"))?;

        if config.chains.is_empty() {
            anyhow::bail!("config declares no chains");
        }
        Ok(config)
    }
}
