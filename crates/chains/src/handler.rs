//! The abstract contract a destination chain implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tbtc_relayer_db::types::{DepositEntry, DepositStatus};
use tbtc_relayer_primitives::ChainFamily;

use crate::errors::ChainResult;

/// Receipt of a submitted transaction. `status` follows EVM receipt
/// semantics: 1 for success, 0 for revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub status: u64,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

/// Parameters for a back-scan recovering missed on-chain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PastDepositsQuery {
    /// How far back to scan.
    pub past_time_minutes: u64,
    /// Chain head at the time the sweep started.
    pub latest_block: i64,
}

/// A destination chain as the engine sees it.
///
/// All methods are async and cancellable. Sweep methods must be idempotent
/// per deposit: a record already past the swept status is skipped, enforced
/// by the lifecycle updaters' status preconditions, so a redundant call
/// costs at most one wasted RPC round-trip.
///
/// Handlers never apply retention policy; deletion belongs to the cleanup
/// engine alone.
#[async_trait]
pub trait ChainHandler: Send + Sync {
    /// The registry key. Lookup is exact-case.
    fn chain_name(&self) -> &str;

    /// Family of the chain, selecting the deposit key variant and the
    /// post-finalization path.
    fn chain_family(&self) -> ChainFamily;

    /// One-shot setup: connect providers, load contracts.
    async fn initialize(&self) -> ChainResult<()>;

    /// Subscribes to on-chain events that feed the lifecycle engine.
    async fn setup_listeners(&self) -> ChainResult<()>;

    /// Whether this chain supports log-range back-scans.
    fn supports_past_deposit_check(&self) -> bool;

    /// Chain head for back-scans. Values ≤ 0 mean "unknown, skip this
    /// sweep".
    async fn get_latest_block(&self) -> ChainResult<i64>;

    /// Back-scans recent history to recover events missed while offline.
    async fn check_for_past_deposits(&self, query: PastDepositsQuery) -> ChainResult<()>;

    /// For each persisted `Queued` deposit on this chain, attempts the L1
    /// initialization submission and advances the record on success.
    async fn process_initialize_deposits(&self) -> ChainResult<()>;

    /// For each `Initialized` deposit, attempts finalization.
    async fn process_finalize_deposits(&self) -> ChainResult<()>;

    /// Drives `Finalized → AwaitingWormholeVaa → Bridged` for chains whose
    /// post-finalization path bridges back through Wormhole. Default no-op.
    async fn process_wormhole_bridging(&self) -> ChainResult<()> {
        Ok(())
    }

    /// Drives pending redemptions through VAA fetch and L1 submission for
    /// chains that support them. Default no-op.
    async fn process_redemptions(&self) -> ChainResult<()> {
        Ok(())
    }

    /// Single-record initialization used by the ingress reveal path.
    async fn initialize_deposit(&self, deposit: &DepositEntry) -> ChainResult<TxReceipt>;

    /// On-chain status probe for a deposit id, if the chain exposes one.
    async fn check_deposit_status(&self, deposit_id: &str)
        -> ChainResult<Option<DepositStatus>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_success_flag() {
        let ok = TxReceipt {
            transaction_hash: "0xaa".into(),
            status: 1,
        };
        let reverted = TxReceipt {
            transaction_hash: "0xbb".into(),
            status: 0,
        };
        assert!(ok.is_success());
        assert!(!reverted.is_success());
    }

    #[test]
    fn receipt_serializes_camel_case() {
        let r = TxReceipt {
            transaction_hash: "0xaa".into(),
            status: 1,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"transactionHash\""));
    }
}
