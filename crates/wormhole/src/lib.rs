//! Wormhole VAA handling: wire codec, SDK-facing trait seams, and the
//! fetch-and-verify pipeline used by L2→L1 redemptions.
//!
//! The service talks to the outside world only through [`ChainContext`],
//! [`TokenBridge`], and [`VaaSource`], so the whole verification algorithm
//! is testable against fakes.

pub mod address;
pub mod chain;
pub mod errors;
pub mod service;
pub mod source;
pub mod traits;
pub mod vaa;

pub use address::UniversalAddress;
pub use chain::WormholeChain;
pub use errors::{VaaFailure, VaaFailureReport, VaaParseError};
pub use service::{VaaService, VaaServiceConfig, VerifiedVaa};
pub use source::PollingVaaSource;
pub use traits::{
    ChainContext, ContextError, ContextResult, MessageId, TokenBridge, TxReceiptInfo, VaaSource,
};
pub use vaa::{GuardianSignature, TokenBridgePayload, Vaa};
