//! The per-chain handler contract and the process-wide handler registry.
//!
//! Every destination chain is driven through the [`ChainHandler`] trait; the
//! engine never sees concrete RPC clients. Handlers are registered once at
//! startup into a [`ChainRegistry`] which is read-only thereafter.

pub mod errors;
pub mod handler;
pub mod registry;

pub use errors::{ChainError, ChainResult};
pub use handler::{ChainHandler, PastDepositsQuery, TxReceipt};
pub use registry::{ChainRegistry, ChainRegistryBuilder};
