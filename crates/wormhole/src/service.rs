//! The fetch-and-verify pipeline for Guardian-signed transfer messages.
//!
//! Stateless per call; the service holds only the long-lived chain contexts
//! and the VAA source handle. The public entry point never returns an
//! error: every failure is classified, logged once, and collapsed to
//! `None`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::address::UniversalAddress;
use crate::chain::WormholeChain;
use crate::errors::{VaaFailure, VaaFailureReport};
use crate::traits::{ChainContext, VaaSource};
use crate::vaa::{Vaa, TOKEN_BRIDGE_PROTOCOL};

/// Default target chain for the L1 completion check.
pub const DEFAULT_TARGET_L1: u16 = WormholeChain::Ethereum as u16;

/// Discriminators tried against the source, in order.
const DISCRIMINATORS: [&str; 2] = ["TokenBridge:TransferWithPayload", "TokenBridge:Transfer"];

#[derive(Debug, Clone, Copy)]
pub struct VaaServiceConfig {
    /// Retry budget the source is allowed internally; also sizes the fetch
    /// timeout.
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Consistency levels below this warn but do not fail.
    pub consistency_floor: u8,
}

impl Default for VaaServiceConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            retry_delay_ms: 60_000,
            consistency_floor: 1,
        }
    }
}

/// A VAA that passed every verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedVaa {
    pub vaa_bytes: Vec<u8>,
    pub vaa: Vaa,
}

pub struct VaaService {
    contexts: HashMap<u16, Arc<dyn ChainContext>>,
    source: Arc<dyn VaaSource>,
    config: VaaServiceConfig,
}

impl VaaService {
    pub fn new(source: Arc<dyn VaaSource>, config: VaaServiceConfig) -> Self {
        Self {
            contexts: HashMap::new(),
            source,
            config,
        }
    }

    /// Registers the SDK context for one chain. Called once per chain at
    /// bootstrap.
    pub fn register_context(&mut self, chain_id: u16, context: Arc<dyn ChainContext>) {
        self.contexts.insert(chain_id, context);
    }

    /// Timeout handed to the source for one `get_vaa` call. A zero retry
    /// budget still gets one delay's worth of time.
    pub fn fetch_timeout(&self) -> Duration {
        let retries = self.config.max_retries.max(1) as u64;
        Duration::from_millis(retries * self.config.retry_delay_ms)
    }

    /// Fetches and fully verifies the transfer VAA emitted by
    /// `l2_tx_hash`. Returns `None` after logging one classified error on
    /// any failure; this method never panics or errors past its boundary.
    pub async fn fetch_and_verify_for_l2_event(
        &self,
        l2_tx_hash: &str,
        emitter_chain: u16,
        emitter_address: &str,
        target_l1_chain: u16,
    ) -> Option<VerifiedVaa> {
        match self
            .try_fetch_and_verify(l2_tx_hash, emitter_chain, emitter_address, target_l1_chain)
            .await
        {
            Ok(verified) => Some(verified),
            Err(report) => {
                error!(
                    code = report.failure.code(),
                    l2_tx = %l2_tx_hash,
                    emitter_chain,
                    "{}", report.message
                );
                None
            }
        }
    }

    /// The pipeline itself, with the failure classification exposed for
    /// callers that report errors themselves.
    pub async fn try_fetch_and_verify(
        &self,
        l2_tx_hash: &str,
        emitter_chain: u16,
        emitter_address: &str,
        target_l1_chain: u16,
    ) -> Result<VerifiedVaa, VaaFailureReport> {
        // 1. L2 receipt.
        let l2_context = self.contexts.get(&emitter_chain).ok_or_else(|| {
            VaaFailureReport::new(
                VaaFailure::L2ReceiptMissing,
                format!("no chain context registered for chain {emitter_chain}"),
            )
        })?;

        let receipt = l2_context
            .transaction_receipt(l2_tx_hash)
            .await
            .map_err(|e| {
                VaaFailureReport::new(
                    VaaFailure::L2ReceiptMissing,
                    format!("receipt fetch for {l2_tx_hash} failed: {e}"),
                )
            })?
            .ok_or_else(|| {
                VaaFailureReport::new(
                    VaaFailure::L2ReceiptMissing,
                    format!("no receipt found for {l2_tx_hash}"),
                )
            })?;

        if receipt.status == 0 {
            return Err(VaaFailureReport::new(
                VaaFailure::L2TxReverted,
                format!("transaction {l2_tx_hash} reverted on chain {emitter_chain}"),
            ));
        }

        // 2. Wormhole messages in the receipt.
        let messages = l2_context.parse_transaction(&receipt).await.map_err(|e| {
            VaaFailureReport::new(
                VaaFailure::NoWormholeMessages,
                format!("could not parse Wormhole messages from {l2_tx_hash}: {e}"),
            )
        })?;

        if messages.is_empty() {
            return Err(VaaFailureReport::new(
                VaaFailure::NoWormholeMessages,
                format!("transaction {l2_tx_hash} emitted no Wormhole messages"),
            ));
        }

        // 3. Select the message from the expected emitter.
        let expected_emitter =
            UniversalAddress::from_native(emitter_address).map_err(|e| {
                VaaFailureReport::new(VaaFailure::NoMatchingEmitter, e.to_string())
            })?;

        let message = messages
            .iter()
            .find(|m| m.chain == emitter_chain && m.emitter == expected_emitter)
            .ok_or_else(|| {
                VaaFailureReport::new(
                    VaaFailure::NoMatchingEmitter,
                    format!(
                        "Relevant Wormhole message not found in {l2_tx_hash} \
                         (expected emitter {expected_emitter} on chain {emitter_chain})"
                    ),
                )
            })?;

        debug!(message_id = %message, "selected Wormhole message");

        // 4. Fetch the VAA, trying discriminators in order.
        let timeout = self.fetch_timeout();
        let mut last_error = None;
        let mut vaa = None;
        for discriminator in DISCRIMINATORS {
            match self.source.get_vaa(message, discriminator, timeout).await {
                Ok(Some(found)) => {
                    vaa = Some(found);
                    break;
                }
                Ok(None) => {}
                Err(e) => last_error = Some(e),
            }
        }

        let vaa = vaa.ok_or_else(|| {
            let detail = match last_error {
                Some(e) => format!(" (last error: {e})"),
                None => String::new(),
            };
            VaaFailureReport::new(
                VaaFailure::VaaNotFound,
                format!("source did not return a VAA for message ID {message}{detail}"),
            )
        })?;

        // 5. Emitter verification.
        if vaa.emitter_chain != emitter_chain || vaa.emitter_address != expected_emitter {
            return Err(VaaFailureReport::new(
                VaaFailure::VaaEmitterMismatch,
                format!(
                    "VAA emitter {}/{} does not match expected {}/{}",
                    vaa.emitter_chain, vaa.emitter_address, emitter_chain, expected_emitter
                ),
            ));
        }
        if vaa.protocol_name() != TOKEN_BRIDGE_PROTOCOL {
            return Err(VaaFailureReport::new(
                VaaFailure::VaaProtocolMismatch,
                format!("VAA protocol {} is not TokenBridge", vaa.protocol_name()),
            ));
        }
        if !matches!(vaa.payload_name(), "Transfer" | "TransferWithPayload") {
            return Err(VaaFailureReport::new(
                VaaFailure::VaaPayloadMismatch,
                format!("VAA payload {} is not a transfer", vaa.payload_name()),
            ));
        }
        if vaa.consistency_level < self.config.consistency_floor {
            warn!(
                message_id = %message,
                consistency_level = vaa.consistency_level,
                floor = self.config.consistency_floor,
                "VAA consistency level below configured floor"
            );
        }

        // 6. L1 completion check.
        let l1_context = self.contexts.get(&target_l1_chain).ok_or_else(|| {
            VaaFailureReport::new(
                VaaFailure::L1CompletionCheckError,
                format!("no chain context registered for target chain {target_l1_chain}"),
            )
        })?;

        let bridge = l1_context.token_bridge().await.map_err(|e| {
            VaaFailureReport::new(
                VaaFailure::L1CompletionCheckError,
                format!("could not acquire token bridge: {e}"),
            )
        })?;

        let completed = bridge.is_transfer_completed(&vaa).await.map_err(|e| {
            VaaFailureReport::new(
                VaaFailure::L1CompletionCheckError,
                format!("isTransferCompleted failed: {e}"),
            )
        })?;

        if !completed {
            return Err(VaaFailureReport::new(
                VaaFailure::VaaTransferNotCompleted,
                format!("transfer for message {message} not completed on chain {target_l1_chain}"),
            ));
        }

        // 7. Wire bytes.
        let vaa_bytes = vaa.wire_bytes();
        if vaa_bytes.is_empty() {
            return Err(VaaFailureReport::new(
                VaaFailure::VaaBytesMissing,
                format!("VAA for message {message} has no wire bytes"),
            ));
        }

        Ok(VerifiedVaa { vaa_bytes, vaa })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::traits::{ContextError, ContextResult, MessageId, TokenBridge, TxReceiptInfo};
    use crate::vaa::{GuardianSignature, SIGNATURE_LEN};
    use alloy_primitives::U256;

    const EMITTER: [u8; 32] = {
        let mut addr = [0u8; 32];
        addr[30] = 0xde;
        addr[31] = 0xad;
        addr
    };

    fn emitter_native() -> String {
        // 20-byte EVM form of EMITTER's low bytes.
        let mut evm = [0u8; 20];
        evm[18] = 0xde;
        evm[19] = 0xad;
        format!("0x{}", hex::encode(evm))
    }

    fn transfer_payload() -> Vec<u8> {
        let mut p = vec![3u8];
        p.extend_from_slice(&U256::from(1_000u64).to_be_bytes::<32>());
        p.extend_from_slice(&[0x01; 32]);
        p.extend_from_slice(&2u16.to_be_bytes());
        p.extend_from_slice(&[0x02; 32]);
        p.extend_from_slice(&2u16.to_be_bytes());
        p.extend_from_slice(&[0x03; 32]);
        p
    }

    fn matching_vaa() -> Vaa {
        Vaa {
            version: 1,
            guardian_set_index: 0,
            signatures: vec![GuardianSignature {
                guardian_index: 0,
                signature: [0; SIGNATURE_LEN],
            }],
            timestamp: 0,
            nonce: 0,
            emitter_chain: WormholeChain::Ethereum as u16,
            emitter_address: UniversalAddress(EMITTER),
            sequence: 123,
            consistency_level: 15,
            payload: transfer_payload(),
            bytes: Some(vec![11, 22, 33, 44, 55]),
        }
    }

    struct FakeContext {
        receipt: Option<TxReceiptInfo>,
        receipt_error: Option<String>,
        messages: Vec<MessageId>,
        transfer_completed: ContextResult<bool>,
    }

    impl FakeContext {
        fn happy() -> Self {
            Self {
                receipt: Some(TxReceiptInfo {
                    tx_hash: "0xl2".into(),
                    status: 1,
                }),
                receipt_error: None,
                messages: vec![MessageId {
                    chain: WormholeChain::Ethereum as u16,
                    emitter: UniversalAddress(EMITTER),
                    sequence: 123,
                }],
                transfer_completed: Ok(true),
            }
        }
    }

    #[async_trait]
    impl ChainContext for FakeContext {
        async fn transaction_receipt(
            &self,
            _tx_hash: &str,
        ) -> ContextResult<Option<TxReceiptInfo>> {
            if let Some(e) = &self.receipt_error {
                return Err(ContextError(e.clone()));
            }
            Ok(self.receipt.clone())
        }

        async fn parse_transaction(
            &self,
            _receipt: &TxReceiptInfo,
        ) -> ContextResult<Vec<MessageId>> {
            Ok(self.messages.clone())
        }

        async fn token_bridge(&self) -> ContextResult<Arc<dyn TokenBridge>> {
            let completed = match &self.transfer_completed {
                Ok(v) => Ok(*v),
                Err(e) => Err(ContextError(e.0.clone())),
            };
            Ok(Arc::new(FakeBridge { completed }))
        }
    }

    struct FakeBridge {
        completed: ContextResult<bool>,
    }

    #[async_trait]
    impl TokenBridge for FakeBridge {
        async fn is_transfer_completed(&self, _vaa: &Vaa) -> ContextResult<bool> {
            match &self.completed {
                Ok(v) => Ok(*v),
                Err(e) => Err(ContextError(e.0.clone())),
            }
        }
    }

    struct FakeSource {
        /// Discriminator → VAA to return; anything else yields None.
        with_payload: Option<Vaa>,
        plain: Option<Vaa>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn returning_with_payload(vaa: Vaa) -> Self {
            Self {
                with_payload: Some(vaa),
                plain: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn empty() -> Self {
            Self {
                with_payload: None,
                plain: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VaaSource for FakeSource {
        async fn get_vaa(
            &self,
            _id: &MessageId,
            discriminator: &str,
            _timeout: Duration,
        ) -> ContextResult<Option<Vaa>> {
            self.calls.lock().push(discriminator.to_string());
            Ok(match discriminator {
                "TokenBridge:TransferWithPayload" => self.with_payload.clone(),
                "TokenBridge:Transfer" => self.plain.clone(),
                _ => None,
            })
        }
    }

    fn service(context: FakeContext, source: Arc<FakeSource>) -> VaaService {
        let mut svc = VaaService::new(source, VaaServiceConfig::default());
        svc.register_context(WormholeChain::Ethereum as u16, Arc::new(context));
        svc
    }

    #[tokio::test]
    async fn happy_path_returns_wire_bytes_and_vaa() {
        let source = Arc::new(FakeSource::returning_with_payload(matching_vaa()));
        let mut svc = service(FakeContext::happy(), source.clone());
        // L1 completion check runs against the target chain's context.
        svc.register_context(
            WormholeChain::Arbitrum as u16,
            Arc::new(FakeContext::happy()),
        );

        let verified = svc
            .fetch_and_verify_for_l2_event(
                "0xl2",
                WormholeChain::Ethereum as u16,
                &emitter_native(),
                WormholeChain::Arbitrum as u16,
            )
            .await
            .expect("should verify");

        assert_eq!(verified.vaa_bytes, vec![11, 22, 33, 44, 55]);
        assert_eq!(verified.vaa, matching_vaa());
    }

    #[tokio::test]
    async fn vaa_not_found_tries_both_discriminators() {
        let source = Arc::new(FakeSource::empty());
        let svc = service(FakeContext::happy(), source.clone());

        let report = svc
            .try_fetch_and_verify(
                "0xl2",
                WormholeChain::Ethereum as u16,
                &emitter_native(),
                DEFAULT_TARGET_L1,
            )
            .await
            .unwrap_err();

        assert_eq!(report.failure, VaaFailure::VaaNotFound);
        assert!(report.message.contains("did not return a VAA for message ID"));

        let calls = source.calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                "TokenBridge:TransferWithPayload".to_string(),
                "TokenBridge:Transfer".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn emitter_mismatch_never_calls_the_source() {
        let mut context = FakeContext::happy();
        context.messages = vec![MessageId {
            chain: WormholeChain::Ethereum as u16,
            emitter: UniversalAddress([0xff; 32]),
            sequence: 123,
        }];
        let source = Arc::new(FakeSource::empty());
        let svc = service(context, source.clone());

        let report = svc
            .try_fetch_and_verify(
                "0xl2",
                WormholeChain::Ethereum as u16,
                &emitter_native(),
                DEFAULT_TARGET_L1,
            )
            .await
            .unwrap_err();

        assert_eq!(report.failure, VaaFailure::NoMatchingEmitter);
        assert!(report.message.contains("Relevant Wormhole message not found"));
        assert!(source.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_receipt_and_reverted_tx_classify_distinctly() {
        let mut context = FakeContext::happy();
        context.receipt = None;
        let svc = service(context, Arc::new(FakeSource::empty()));
        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::L2ReceiptMissing);

        let mut context = FakeContext::happy();
        context.receipt = Some(TxReceiptInfo {
            tx_hash: "0xl2".into(),
            status: 0,
        });
        let svc = service(context, Arc::new(FakeSource::empty()));
        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::L2TxReverted);
    }

    #[tokio::test]
    async fn no_messages_classifies() {
        let mut context = FakeContext::happy();
        context.messages = Vec::new();
        let svc = service(context, Arc::new(FakeSource::empty()));
        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::NoWormholeMessages);
    }

    #[tokio::test]
    async fn wrong_emitter_on_vaa_is_a_mismatch() {
        let mut vaa = matching_vaa();
        vaa.emitter_address = UniversalAddress([0xff; 32]);
        let source = Arc::new(FakeSource::returning_with_payload(vaa));
        let svc = service(FakeContext::happy(), source);

        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::VaaEmitterMismatch);
    }

    #[tokio::test]
    async fn non_token_bridge_payload_is_a_protocol_mismatch() {
        let mut vaa = matching_vaa();
        vaa.payload = vec![9, 1, 2, 3];
        let source = Arc::new(FakeSource::returning_with_payload(vaa));
        let svc = service(FakeContext::happy(), source);

        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::VaaProtocolMismatch);
    }

    #[tokio::test]
    async fn incomplete_transfer_classifies() {
        let source = Arc::new(FakeSource::returning_with_payload(matching_vaa()));
        let mut context = FakeContext::happy();
        context.transfer_completed = Ok(false);
        let svc = service(context, source);

        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::VaaTransferNotCompleted);
    }

    #[tokio::test]
    async fn bridge_errors_classify_as_l1_check_error() {
        let source = Arc::new(FakeSource::returning_with_payload(matching_vaa()));
        let mut context = FakeContext::happy();
        context.transfer_completed = Err(ContextError("bridge unreachable".into()));
        let svc = service(context, source);

        let report = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap_err();
        assert_eq!(report.failure, VaaFailure::L1CompletionCheckError);
    }

    #[tokio::test]
    async fn missing_wire_bytes_fall_back_to_serialization() {
        let mut vaa = matching_vaa();
        vaa.bytes = None;
        let expected = vaa.serialize();
        let source = Arc::new(FakeSource::returning_with_payload(vaa));
        let svc = service(FakeContext::happy(), source);

        let verified = svc
            .try_fetch_and_verify("0xl2", 2, &emitter_native(), DEFAULT_TARGET_L1)
            .await
            .unwrap();
        assert_eq!(verified.vaa_bytes, expected);
    }

    #[test]
    fn zero_retry_budget_keeps_a_minimum_timeout() {
        let svc = VaaService::new(
            Arc::new(FakeSource::empty()),
            VaaServiceConfig {
                max_retries: 0,
                retry_delay_ms: 60_000,
                consistency_floor: 1,
            },
        );
        assert_eq!(svc.fetch_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn default_timeout_is_retries_times_delay() {
        let svc = VaaService::new(
            Arc::new(FakeSource::empty()),
            VaaServiceConfig::default(),
        );
        assert_eq!(svc.fetch_timeout(), Duration::from_secs(300));
    }
}
