//! Primitive types shared across the relayer: deposit key derivation, chain
//! families, and timestamp helpers.

pub mod btc;
pub mod chain;
pub mod deposit_key;
pub mod time;

pub use chain::ChainFamily;
pub use deposit_key::{derive_deposit_id, DepositKeyError};
