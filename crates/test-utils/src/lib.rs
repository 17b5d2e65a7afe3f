//! Shared test doubles: a programmable chain handler driving the real
//! lifecycle updaters over an in-memory store, plus reveal payload
//! builders.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tbtc_relayer_chains::{
    ChainError, ChainHandler, ChainResult, PastDepositsQuery, TxReceipt,
};
use tbtc_relayer_db::traits::DepositStore;
use tbtc_relayer_db::types::{DepositEntry, DepositStatus, FundingTransaction};
use tbtc_relayer_db::MemoryDb;
use tbtc_relayer_lifecycle::deposit::{
    update_to_awaiting_wormhole_vaa, update_to_bridged, update_to_finalized,
    update_to_initialized, TransitionOutcome,
};
use tbtc_relayer_lifecycle::reveal::{RevealPayload, RevealRequest};
use tbtc_relayer_lifecycle::AuditLogger;
use tbtc_relayer_primitives::ChainFamily;

/// A chain handler whose submissions always "confirm" with fixed hashes.
/// Sweeps run the real lifecycle updaters against the shared store, so
/// tests exercise the same persistence discipline as production handlers.
pub struct MockChainHandler {
    chain_name: String,
    family: ChainFamily,
    db: Arc<MemoryDb>,
    audit: AuditLogger,

    pub init_tx_hash: String,
    pub finalize_tx_hash: String,
    pub bridge_tx_hash: String,
    pub transfer_sequence: String,
    pub latest_block: Mutex<i64>,
    pub supports_past_check: bool,

    /// When set, `initialize_deposit` and the initialize sweep fail with
    /// this error message instead of confirming.
    pub fail_initialize: Mutex<Option<String>>,

    pub initialize_calls: Mutex<u32>,
    pub past_checks: Mutex<Vec<PastDepositsQuery>>,
}

impl MockChainHandler {
    pub fn new(chain_name: &str, family: ChainFamily, db: Arc<MemoryDb>) -> Self {
        Self {
            chain_name: chain_name.to_string(),
            family,
            audit: AuditLogger::new(db.clone()),
            db,
            init_tx_hash: format!("0x{}", "aa".repeat(32)),
            finalize_tx_hash: format!("0x{}", "bb".repeat(32)),
            bridge_tx_hash: format!("0x{}", "cc".repeat(32)),
            transfer_sequence: "123".to_string(),
            latest_block: Mutex::new(1_000),
            supports_past_check: true,
            fail_initialize: Mutex::new(None),
            initialize_calls: Mutex::new(0),
            past_checks: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChainHandler for MockChainHandler {
    fn chain_name(&self) -> &str {
        &self.chain_name
    }

    fn chain_family(&self) -> ChainFamily {
        self.family
    }

    async fn initialize(&self) -> ChainResult<()> {
        Ok(())
    }

    async fn setup_listeners(&self) -> ChainResult<()> {
        Ok(())
    }

    fn supports_past_deposit_check(&self) -> bool {
        self.supports_past_check
    }

    async fn get_latest_block(&self) -> ChainResult<i64> {
        Ok(*self.latest_block.lock())
    }

    async fn check_for_past_deposits(&self, query: PastDepositsQuery) -> ChainResult<()> {
        self.past_checks.lock().push(query);
        Ok(())
    }

    async fn process_initialize_deposits(&self) -> ChainResult<()> {
        let queued = self
            .db
            .get_deposits_by_status(DepositStatus::Queued, Some(self.chain_name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;

        for entry in queued {
            let fail_initialize = self.fail_initialize.lock();
            let outcome = match &*fail_initialize {
                Some(error) => TransitionOutcome::Failed { error },
                None => TransitionOutcome::Confirmed {
                    tx_hash: &self.init_tx_hash,
                },
            };
            update_to_initialized(&*self.db, &self.audit, &entry, outcome)
                .map_err(|e| ChainError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn process_finalize_deposits(&self) -> ChainResult<()> {
        let initialized = self
            .db
            .get_deposits_by_status(DepositStatus::Initialized, Some(self.chain_name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;

        for entry in initialized {
            update_to_finalized(&*self.db, &self.audit, &entry, TransitionOutcome::Confirmed {
                tx_hash: &self.finalize_tx_hash,
            })
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn process_wormhole_bridging(&self) -> ChainResult<()> {
        if !self.family.requires_bridging() {
            return Ok(());
        }

        let awaiting = self
            .db
            .get_deposits_by_status(DepositStatus::AwaitingWormholeVaa, Some(self.chain_name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;
        for entry in awaiting {
            update_to_bridged(&*self.db, &self.audit, &entry, TransitionOutcome::Confirmed {
                tx_hash: &self.bridge_tx_hash,
            })
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }

        let finalized = self
            .db
            .get_deposits_by_status(DepositStatus::Finalized, Some(self.chain_name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;
        for entry in finalized {
            update_to_awaiting_wormhole_vaa(
                &*self.db,
                &self.audit,
                &entry,
                &self.transfer_sequence,
                &self.init_tx_hash,
            )
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn initialize_deposit(&self, _deposit: &DepositEntry) -> ChainResult<TxReceipt> {
        *self.initialize_calls.lock() += 1;
        if let Some(error) = &*self.fail_initialize.lock() {
            return Err(ChainError::Rpc(error.clone()));
        }
        Ok(TxReceipt {
            transaction_hash: self.init_tx_hash.clone(),
            status: 1,
        })
    }

    async fn check_deposit_status(
        &self,
        deposit_id: &str,
    ) -> ChainResult<Option<DepositStatus>> {
        self.db
            .get_deposit(deposit_id)
            .map(|e| e.map(|e| e.status))
            .map_err(|e| ChainError::Other(e.to_string()))
    }
}

/// A well-formed reveal request for ingress tests.
pub fn valid_reveal_request() -> RevealRequest {
    RevealRequest {
        funding_tx: FundingTransaction {
            version: "0x01000000".into(),
            input_vector: "0x0101".into(),
            output_vector: "0x0101".into(),
            locktime: "0x00000000".into(),
        },
        reveal: RevealPayload {
            funding_output_index: 0,
            blinding_factor: "0xf9f0c90d00039523".into(),
            wallet_public_key_hash: format!("0x{}", "ab".repeat(20)),
            refund_public_key_hash: format!("0x{}", "cd".repeat(20)),
            refund_locktime: "1740000000".into(),
            vault: None,
        },
        l2_deposit_owner: format!("0x{}", "11".repeat(20)),
        l2_sender: format!("0x{}", "22".repeat(20)),
    }
}
