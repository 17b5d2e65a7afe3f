//! Simulated chain backend.
//!
//! Real destination chains plug in behind the [`ChainHandler`] trait from
//! their own crates; this in-tree backend confirms every submission
//! instantly with deterministic transaction hashes and serves Guardian
//! messages from a synthetic source, so the whole engine (sweeps,
//! state machines, VAA pipeline, cleanup) runs end-to-end in local and
//! staging deployments.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tbtc_relayer_chains::{
    ChainError, ChainHandler, ChainResult, PastDepositsQuery, TxReceipt,
};
use tbtc_relayer_db::traits::{DepositStore, RedemptionStore};
use tbtc_relayer_db::types::{DepositEntry, DepositStatus, RedemptionEntry};
use tbtc_relayer_lifecycle::deposit::{
    update_to_awaiting_wormhole_vaa, update_to_bridged, update_to_finalized,
    update_to_initialized, TransitionOutcome,
};
use tbtc_relayer_lifecycle::redemption::{
    RedemptionProcessor, RedemptionSubmitter, RedemptionVaaSource,
};
use tbtc_relayer_lifecycle::AuditLogger;
use tbtc_relayer_primitives::ChainFamily;
use tbtc_relayer_wormhole::{
    ChainContext, ContextResult, GuardianSignature, MessageId, PollingVaaSource, TokenBridge,
    TxReceiptInfo, UniversalAddress, Vaa, VaaService, VaaServiceConfig, VaaSource, WormholeChain,
};
use tracing::debug;

use crate::config::{ChainConfig, VaaConfig};

/// Deterministic pseudo transaction hash for a simulated submission.
fn sim_tx_hash(tag: &str, id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tag.as_bytes());
    hasher.update(id.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// Deterministic message sequence for a simulated L2 transaction.
fn sim_sequence(l2_tx_hash: &str) -> u64 {
    let digest = Sha256::digest(l2_tx_hash.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().expect("len 8"))
}

/// A chain context whose receipts always succeed and whose transactions
/// emit exactly one message from the configured emitter.
struct SimChainContext {
    chain_id: u16,
    emitter: UniversalAddress,
}

#[async_trait]
impl ChainContext for SimChainContext {
    async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> ContextResult<Option<TxReceiptInfo>> {
        Ok(Some(TxReceiptInfo {
            tx_hash: tx_hash.to_string(),
            status: 1,
        }))
    }

    async fn parse_transaction(&self, receipt: &TxReceiptInfo) -> ContextResult<Vec<MessageId>> {
        Ok(vec![MessageId {
            chain: self.chain_id,
            emitter: self.emitter,
            sequence: sim_sequence(&receipt.tx_hash),
        }])
    }

    async fn token_bridge(&self) -> ContextResult<Arc<dyn TokenBridge>> {
        Ok(Arc::new(SimTokenBridge))
    }
}

struct SimTokenBridge;

#[async_trait]
impl TokenBridge for SimTokenBridge {
    async fn is_transfer_completed(&self, _vaa: &Vaa) -> ContextResult<bool> {
        Ok(true)
    }
}

/// Synthesizes a token bridge VAA for whatever message is asked of it.
struct SimVaaSource;

#[async_trait]
impl VaaSource for SimVaaSource {
    async fn get_vaa(
        &self,
        id: &MessageId,
        discriminator: &str,
        _timeout: Duration,
    ) -> ContextResult<Option<Vaa>> {
        if discriminator != "TokenBridge:TransferWithPayload" {
            return Ok(None);
        }

        let mut payload = vec![3u8];
        payload.extend_from_slice(&[0u8; 32]); // amount
        payload.extend_from_slice(&[0u8; 32]); // token address
        payload.extend_from_slice(&id.chain.to_be_bytes());
        payload.extend_from_slice(&[0u8; 32]); // recipient
        payload.extend_from_slice(&(WormholeChain::Ethereum as u16).to_be_bytes());
        payload.extend_from_slice(&[0u8; 32]); // sender

        let mut vaa = Vaa {
            version: 1,
            guardian_set_index: 0,
            signatures: vec![GuardianSignature {
                guardian_index: 0,
                signature: [0u8; 65],
            }],
            timestamp: 0,
            nonce: 0,
            emitter_chain: id.chain,
            emitter_address: id.emitter,
            sequence: id.sequence,
            consistency_level: 32,
            payload,
            bytes: None,
        };
        vaa.bytes = Some(vaa.serialize());
        Ok(Some(vaa))
    }
}

/// Bridges the VAA service into the redemption sweep.
struct VaaRetriever {
    service: Arc<VaaService>,
    emitter_chain: u16,
    emitter_address: String,
}

#[async_trait]
impl RedemptionVaaSource for VaaRetriever {
    async fn fetch_vaa(&self, redemption: &RedemptionEntry) -> Option<Vec<u8>> {
        self.service
            .fetch_and_verify_for_l2_event(
                &redemption.event.l2_transaction_hash,
                self.emitter_chain,
                &self.emitter_address,
                WormholeChain::Ethereum as u16,
            )
            .await
            .map(|verified| verified.vaa_bytes)
    }
}

struct SimRedemptionSubmitter;

#[async_trait]
impl RedemptionSubmitter for SimRedemptionSubmitter {
    async fn submit_redemption(&self, redemption: &RedemptionEntry) -> ChainResult<TxReceipt> {
        Ok(TxReceipt {
            transaction_hash: sim_tx_hash("redemption", &redemption.id),
            status: 1,
        })
    }
}

/// The simulated destination chain.
pub(crate) struct SimulatedChainHandler {
    name: String,
    family: ChainFamily,
    deposits: Arc<dyn DepositStore>,
    audit: AuditLogger,
    redemptions: RedemptionProcessor,
}

impl SimulatedChainHandler {
    pub(crate) fn new(
        chain: &ChainConfig,
        vaa: &VaaConfig,
        deposits: Arc<dyn DepositStore>,
        redemption_store: Arc<dyn RedemptionStore>,
        audit: AuditLogger,
    ) -> ChainResult<Self> {
        let emitter = UniversalAddress::from_native(&chain.emitter_address)
            .map_err(|e| ChainError::Refused(e.to_string()))?;

        let mut service = VaaService::new(
            Arc::new(PollingVaaSource::new(SimVaaSource, Duration::from_secs(5))),
            VaaServiceConfig {
                max_retries: vaa.fetch_max_retries,
                retry_delay_ms: vaa.fetch_retry_delay_ms,
                consistency_floor: 1,
            },
        );
        let context = Arc::new(SimChainContext {
            chain_id: chain.wormhole_chain_id,
            emitter,
        });
        service.register_context(chain.wormhole_chain_id, context.clone());
        if chain.wormhole_chain_id != WormholeChain::Ethereum as u16 {
            service.register_context(WormholeChain::Ethereum as u16, context);
        }

        let retriever = VaaRetriever {
            service: Arc::new(service),
            emitter_chain: chain.wormhole_chain_id,
            emitter_address: chain.emitter_address.clone(),
        };

        let redemptions = RedemptionProcessor::new(
            redemption_store,
            audit.clone(),
            Arc::new(retriever),
            Arc::new(SimRedemptionSubmitter),
            chain.name.clone(),
            vaa.max_attempts_before_failed,
        );

        Ok(Self {
            name: chain.name.clone(),
            family: chain.family,
            deposits,
            audit,
            redemptions,
        })
    }
}

#[async_trait]
impl ChainHandler for SimulatedChainHandler {
    fn chain_name(&self) -> &str {
        &self.name
    }

    fn chain_family(&self) -> ChainFamily {
        self.family
    }

    async fn initialize(&self) -> ChainResult<()> {
        debug!(chain = %self.name, "simulated chain connected");
        Ok(())
    }

    async fn setup_listeners(&self) -> ChainResult<()> {
        // The simulated chain emits no spontaneous events; everything comes
        // in through the reveal endpoint.
        Ok(())
    }

    fn supports_past_deposit_check(&self) -> bool {
        false
    }

    async fn get_latest_block(&self) -> ChainResult<i64> {
        Ok(0)
    }

    async fn check_for_past_deposits(&self, _query: PastDepositsQuery) -> ChainResult<()> {
        Ok(())
    }

    async fn process_initialize_deposits(&self) -> ChainResult<()> {
        let queued = self
            .deposits
            .get_deposits_by_status(DepositStatus::Queued, Some(self.name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;

        for entry in queued {
            let tx_hash = sim_tx_hash("initialize", &entry.id);
            update_to_initialized(
                &*self.deposits,
                &self.audit,
                &entry,
                TransitionOutcome::Confirmed { tx_hash: &tx_hash },
            )
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn process_finalize_deposits(&self) -> ChainResult<()> {
        let initialized = self
            .deposits
            .get_deposits_by_status(DepositStatus::Initialized, Some(self.name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;

        for entry in initialized {
            let tx_hash = sim_tx_hash("finalize", &entry.id);
            update_to_finalized(
                &*self.deposits,
                &self.audit,
                &entry,
                TransitionOutcome::Confirmed { tx_hash: &tx_hash },
            )
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn process_wormhole_bridging(&self) -> ChainResult<()> {
        if !self.family.requires_bridging() {
            return Ok(());
        }

        let awaiting = self
            .deposits
            .get_deposits_by_status(DepositStatus::AwaitingWormholeVaa, Some(self.name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;
        for entry in awaiting {
            let tx_hash = sim_tx_hash("bridge", &entry.id);
            update_to_bridged(
                &*self.deposits,
                &self.audit,
                &entry,
                TransitionOutcome::Confirmed { tx_hash: &tx_hash },
            )
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }

        let finalized = self
            .deposits
            .get_deposits_by_status(DepositStatus::Finalized, Some(self.name.as_str()))
            .map_err(|e| ChainError::Other(e.to_string()))?;
        for entry in finalized {
            let sequence = sim_sequence(&entry.id).to_string();
            let tx_hash = sim_tx_hash("transfer", &entry.id);
            update_to_awaiting_wormhole_vaa(
                &*self.deposits,
                &self.audit,
                &entry,
                &sequence,
                &tx_hash,
            )
            .map_err(|e| ChainError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn process_redemptions(&self) -> ChainResult<()> {
        self.redemptions
            .run()
            .await
            .map_err(|e| ChainError::Other(e.to_string()))
    }

    async fn initialize_deposit(&self, deposit: &DepositEntry) -> ChainResult<TxReceipt> {
        Ok(TxReceipt {
            transaction_hash: sim_tx_hash("initialize", &deposit.id),
            status: 1,
        })
    }

    async fn check_deposit_status(
        &self,
        deposit_id: &str,
    ) -> ChainResult<Option<DepositStatus>> {
        self.deposits
            .get_deposit(deposit_id)
            .map(|entry| entry.map(|e| e.status))
            .map_err(|e| ChainError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use tbtc_relayer_db::types::{RedemptionRequestedEvent, RedemptionStatus};
    use tbtc_relayer_db::MemoryDb;

    use super::*;

    fn chain_config(name: &str, family: ChainFamily, wormhole_id: u16) -> ChainConfig {
        ChainConfig {
            name: name.into(),
            family,
            rpc_url: "http://localhost:0".into(),
            contract_address: format!("0x{}", "11".repeat(20)),
            confirmations: 1,
            wormhole_chain_id: wormhole_id,
            emitter_address: format!("0x{}", "22".repeat(20)),
        }
    }

    #[tokio::test]
    async fn redemption_flows_through_the_real_vaa_pipeline() {
        let db = Arc::new(MemoryDb::new());
        let handler = SimulatedChainHandler::new(
            &chain_config("SimArbitrum", ChainFamily::Evm, 23),
            &VaaConfig::default(),
            db.clone(),
            db.clone(),
            AuditLogger::new(db.clone()),
        )
        .unwrap();

        let redemption = RedemptionEntry::new_pending(
            "SimArbitrum".into(),
            RedemptionRequestedEvent {
                l2_transaction_hash: "0xredeem".into(),
                amount: "100".into(),
                ..Default::default()
            },
        );
        db.create_redemption(&redemption).unwrap();

        handler.process_redemptions().await.unwrap();

        let stored = db.get_redemption(&redemption.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::Completed);
        assert!(stored.l1_submission_tx_hash.is_some());

        // The stored bytes are a real VAA from the verification pipeline.
        let vaa = Vaa::parse(stored.vaa_bytes.as_deref().unwrap()).unwrap();
        assert_eq!(vaa.emitter_chain, 23);
        assert_eq!(vaa.sequence, sim_sequence("0xredeem"));
    }

    #[tokio::test]
    async fn deposit_sweeps_are_deterministic_and_idempotent() {
        let db = Arc::new(MemoryDb::new());
        let handler = SimulatedChainHandler::new(
            &chain_config("SimBase", ChainFamily::Evm, 30),
            &VaaConfig::default(),
            db.clone(),
            db.clone(),
            AuditLogger::new(db.clone()),
        )
        .unwrap();

        let entry = DepositEntry::new_queued(
            "99".into(),
            "SimBase".into(),
            "0xbtc".into(),
            0,
            "0xowner".into(),
            Default::default(),
            None,
        );
        db.create_deposit(&entry).unwrap();

        handler.process_initialize_deposits().await.unwrap();
        let first = db.get_deposit("99").unwrap().unwrap();
        assert_eq!(first.status, DepositStatus::Initialized);

        // A second sweep finds nothing queued and changes nothing.
        handler.process_initialize_deposits().await.unwrap();
        assert_eq!(db.get_deposit("99").unwrap().unwrap(), first);

        handler.process_finalize_deposits().await.unwrap();
        let finalized = db.get_deposit("99").unwrap().unwrap();
        assert_eq!(finalized.status, DepositStatus::Finalized);
        assert_eq!(
            finalized.hashes.eth.finalize_tx_hash.as_deref(),
            Some(sim_tx_hash("finalize", "99").as_str())
        );
    }
}
