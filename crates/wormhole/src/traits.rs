//! Trait seams around the Wormhole SDK surface the service consumes.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::address::UniversalAddress;
use crate::vaa::Vaa;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ContextError(pub String);

pub type ContextResult<T> = Result<T, ContextError>;

/// Identity of a Wormhole message: the emitting (chain, address) pair plus
/// the per-emitter sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageId {
    pub chain: u16,
    pub emitter: UniversalAddress,
    pub sequence: u64,
}

impl Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.chain, self.emitter, self.sequence)
    }
}

/// A transaction receipt as far as the pipeline cares: success flag plus an
/// opaque handle the owning context can decode messages out of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceiptInfo {
    pub tx_hash: String,
    /// EVM receipt semantics: 0 means reverted.
    pub status: u64,
}

/// One chain's SDK context.
#[async_trait]
pub trait ChainContext: Send + Sync {
    /// Fetches a transaction receipt. `Ok(None)` means the transaction is
    /// unknown to the chain.
    async fn transaction_receipt(&self, tx_hash: &str) -> ContextResult<Option<TxReceiptInfo>>;

    /// Decodes the Wormhole messages a transaction emitted.
    async fn parse_transaction(&self, receipt: &TxReceiptInfo) -> ContextResult<Vec<MessageId>>;

    /// The chain's token bridge handle.
    async fn token_bridge(&self) -> ContextResult<Arc<dyn TokenBridge>>;
}

/// The token bridge contract surface.
#[async_trait]
pub trait TokenBridge: Send + Sync {
    /// Whether this VAA's transfer has been redeemed on this chain.
    async fn is_transfer_completed(&self, vaa: &Vaa) -> ContextResult<bool>;
}

/// Source of Guardian-signed VAAs (Wormholescan or a Guardian node).
#[async_trait]
pub trait VaaSource: Send + Sync {
    /// Fetches and decodes the VAA for a message under the given payload
    /// discriminator (e.g. `TokenBridge:TransferWithPayload`). `Ok(None)`
    /// means the source does not have it (yet).
    async fn get_vaa(
        &self,
        id: &MessageId,
        discriminator: &str,
        timeout: Duration,
    ) -> ContextResult<Option<Vaa>>;
}
