//! Redemption record model.

use serde::{Deserialize, Serialize};
use tbtc_relayer_primitives::time::now_millis;

use super::hex_opt;

/// Lifecycle phase of an L2→L1 redemption. `VaaFailed` and `Failed` are
/// terminal failure branches; the others are ordered forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionStatus {
    /// Observed on L2, VAA not yet retrieved.
    Pending,

    /// Guardian-signed VAA fetched and verified.
    VaaFetched,

    /// L1 submission confirmed. Terminal.
    Completed,

    /// VAA retrieval failed past the retry budget. Terminal.
    VaaFailed,

    /// L1 submission failed past the retry budget. Terminal.
    Failed,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::VaaFetched => "VAA_FETCHED",
            Self::Completed => "COMPLETED",
            Self::VaaFailed => "VAA_FAILED",
            Self::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::VaaFailed | Self::Failed)
    }
}

/// Progress of the VAA retrieval for a redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaaStatus {
    Pending,
    Fetched,
    Failed,
}

/// The `RedemptionRequested` event fields captured from the L2.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequestedEvent {
    pub wallet_public_key_hash: String,
    pub main_utxo: String,
    pub redeemer_output_script: String,
    pub amount: String,
    pub l2_transaction_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionDates {
    pub created_at: u64,
    pub vaa_fetched_at: Option<u64>,
    pub l1_submitted_at: Option<u64>,
    pub completed_at: Option<u64>,
    pub last_activity_at: u64,
}

/// A redemption record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionEntry {
    pub id: String,
    pub chain_name: String,
    pub event: RedemptionRequestedEvent,
    #[serde(with = "hex_opt")]
    pub vaa_bytes: Option<Vec<u8>>,
    pub vaa_status: VaaStatus,
    /// Retrieval attempts so far, gating the move to `VaaFailed`.
    pub vaa_fetch_attempts: u32,
    pub l1_submission_tx_hash: Option<String>,
    pub status: RedemptionStatus,
    pub error: Option<String>,
    pub dates: RedemptionDates,
    pub logs: Vec<String>,
}

impl RedemptionEntry {
    /// Derives the redemption id from the emitting L2 transaction hash and
    /// the chain name.
    pub fn derive_id(chain_name: &str, l2_transaction_hash: &str) -> String {
        format!("{chain_name}-{l2_transaction_hash}")
    }

    /// Builds a fresh `Pending` entry from an observed L2 event.
    pub fn new_pending(chain_name: String, event: RedemptionRequestedEvent) -> Self {
        let now = now_millis();
        let id = Self::derive_id(&chain_name, &event.l2_transaction_hash);
        Self {
            id,
            chain_name,
            event,
            vaa_bytes: None,
            vaa_status: VaaStatus::Pending,
            vaa_fetch_attempts: 0,
            l1_submission_tx_hash: None,
            status: RedemptionStatus::Pending,
            error: None,
            dates: RedemptionDates {
                created_at: now,
                vaa_fetched_at: None,
                l1_submitted_at: None,
                completed_at: None,
                last_activity_at: now,
            },
            logs: Vec::new(),
        }
    }

    /// Appends a human-readable progress line.
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }
}
