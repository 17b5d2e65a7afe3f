//! Deposit record model.

use serde::{Deserialize, Serialize};
use tbtc_relayer_primitives::time::now_millis;

/// Lifecycle phase of a deposit. Ordered: transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositStatus {
    /// Revealed but not yet initialized on L1.
    Queued,

    /// L1 initialization transaction confirmed.
    Initialized,

    /// L1 finalization transaction confirmed. Terminal for plain EVM targets.
    Finalized,

    /// Waiting on the Guardian network to sign the transfer message.
    AwaitingWormholeVaa,

    /// Bridged back to the destination chain. Terminal.
    Bridged,
}

impl DepositStatus {
    /// Status name as stored in audit payloads, e.g. `QUEUED`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Initialized => "INITIALIZED",
            Self::Finalized => "FINALIZED",
            Self::AwaitingWormholeVaa => "AWAITING_WORMHOLE_VAA",
            Self::Bridged => "BRIDGED",
        }
    }
}

/// Per-chain-side transaction hashes accumulated over the lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositHashes {
    pub btc: BtcHashes,
    pub eth: EthHashes,
    pub solana: SolanaHashes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcHashes {
    pub btc_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthHashes {
    pub initialize_tx_hash: Option<String>,
    pub finalize_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaHashes {
    pub bridge_tx_hash: Option<String>,
}

/// The revealed deposit parameters, mirroring the on-chain deposit receipt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositReceipt {
    pub depositor: String,
    pub blinding_factor: String,
    pub wallet_public_key_hash: String,
    pub refund_public_key_hash: String,
    pub refund_locktime: String,
    pub extra_data: Option<String>,
}

/// Raw Bitcoin funding transaction fields as revealed by the depositor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingTransaction {
    pub version: String,
    pub input_vector: String,
    pub output_vector: String,
    pub locktime: String,
}

/// The reveal parameters accompanying the funding transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reveal {
    pub funding_output_index: u32,
    pub blinding_factor: String,
    pub wallet_public_key_hash: String,
    pub refund_public_key_hash: String,
    pub refund_locktime: String,
    pub vault: Option<String>,
}

/// Everything needed to (re)submit the L1 initialization for this deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1OutputEvent {
    pub funding_tx: FundingTransaction,
    pub reveal: Reveal,
    pub l2_deposit_owner: String,
    pub l2_sender: String,
}

/// Epoch-millisecond markers for each lifecycle phase. `None` means the
/// phase has not been reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositDates {
    pub created_at: u64,
    pub initialization_at: Option<u64>,
    pub finalization_at: Option<u64>,
    pub awaiting_wormhole_vaa_message_since: Option<u64>,
    pub bridged_at: Option<u64>,
    pub last_activity_at: u64,
}

/// Wormhole bridging bookkeeping for chains with a bridge-back leg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WormholeInfo {
    pub tx_hash: Option<String>,
    pub transfer_sequence: Option<String>,
    pub bridging_attempted: bool,
}

/// Date field the cleanup engine ages a deposit by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepositDateField {
    CreatedAt,
    FinalizationAt,
    BridgedAt,
}

/// A deposit record. Created on first reveal, mutated only through the
/// lifecycle updaters, deleted only by the cleanup engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositEntry {
    pub id: String,
    pub chain_name: String,
    pub funding_tx_hash: String,
    pub funding_output_index: u32,
    pub owner: String,
    pub hashes: DepositHashes,
    pub receipt: DepositReceipt,
    pub l1_output_event: Option<L1OutputEvent>,
    pub status: DepositStatus,
    pub dates: DepositDates,
    pub wormhole: WormholeInfo,
    pub error: Option<String>,
}

impl DepositEntry {
    /// Builds a fresh `Queued` entry. Only the Bitcoin funding hash is set;
    /// every other hash and phase date starts null.
    pub fn new_queued(
        id: String,
        chain_name: String,
        funding_tx_hash: String,
        funding_output_index: u32,
        owner: String,
        receipt: DepositReceipt,
        l1_output_event: Option<L1OutputEvent>,
    ) -> Self {
        let now = now_millis();
        Self {
            id,
            chain_name,
            funding_tx_hash: funding_tx_hash.clone(),
            funding_output_index,
            owner,
            hashes: DepositHashes {
                btc: BtcHashes {
                    btc_tx_hash: Some(funding_tx_hash),
                },
                ..Default::default()
            },
            receipt,
            l1_output_event,
            status: DepositStatus::Queued,
            dates: DepositDates {
                created_at: now,
                initialization_at: None,
                finalization_at: None,
                awaiting_wormhole_vaa_message_since: None,
                bridged_at: None,
                last_activity_at: now,
            },
            wormhole: WormholeInfo::default(),
            error: None,
        }
    }

    /// Reads the date field the cleanup engine keys off, if set.
    pub fn date_field(&self, field: DepositDateField) -> Option<u64> {
        match field {
            DepositDateField::CreatedAt => Some(self.dates.created_at),
            DepositDateField::FinalizationAt => self.dates.finalization_at,
            DepositDateField::BridgedAt => self.dates.bridged_at,
        }
    }
}
