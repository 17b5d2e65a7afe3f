//! Deterministic deposit identifier derivation.
//!
//! A deposit is identified by the keccak hash of its Bitcoin funding outpoint:
//! `keccak256(txid_bytes ‖ u32_be(output_index))`, rendered as the decimal
//! form of the resulting 256-bit integer. EVM targets hash the txid in
//! reversed (internal) byte order; StarkNet hashes the display order bytes
//! as-is.

use alloy_primitives::{keccak256, U256};
use thiserror::Error;

use crate::chain::ChainFamily;

/// Error validating the inputs to deposit key derivation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DepositKeyError {
    #[error("funding tx hash must be a 0x-prefixed 64-char hex string, got {0:?}")]
    MalformedTxHash(String),

    #[error("funding tx hash has invalid hex: {0}")]
    InvalidHex(String),
}

/// Derives the canonical deposit id for a funding outpoint.
///
/// Pure and total over valid inputs: the same `(tx_hash, index, family)`
/// triple always yields the same id, and distinct outpoints yield distinct
/// ids under Bitcoin txid uniqueness.
pub fn derive_deposit_id(
    funding_tx_hash: &str,
    funding_output_index: u32,
    family: ChainFamily,
) -> Result<String, DepositKeyError> {
    let mut txid = parse_funding_tx_hash(funding_tx_hash)?;

    if family.reverses_funding_txid() {
        txid.reverse();
    }

    let mut preimage = [0u8; 36];
    preimage[..32].copy_from_slice(&txid);
    preimage[32..].copy_from_slice(&funding_output_index.to_be_bytes());

    let digest = keccak256(preimage);
    Ok(U256::from_be_bytes(digest.0).to_string())
}

/// Parses and validates a 0x-prefixed 32-byte funding tx hash.
pub fn parse_funding_tx_hash(funding_tx_hash: &str) -> Result<[u8; 32], DepositKeyError> {
    let Some(stripped) = funding_tx_hash.strip_prefix("0x") else {
        return Err(DepositKeyError::MalformedTxHash(funding_tx_hash.to_string()));
    };

    if stripped.len() != 64 {
        return Err(DepositKeyError::MalformedTxHash(funding_tx_hash.to_string()));
    }

    let bytes =
        hex::decode(stripped).map_err(|e| DepositKeyError::InvalidHex(e.to_string()))?;

    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
