//! Bitcoin funding transaction identity.
//!
//! The reveal payload carries the funding transaction in its four legacy
//! serialization pieces (version, input vector, output vector, locktime),
//! which is exactly the double-SHA256 preimage of the txid. Hashing them
//! here avoids needing a Bitcoin node just to identify the deposit.

use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FundingTxError {
    #[error("funding tx field {0} is not valid hex")]
    InvalidHex(&'static str),
}

/// Computes the display-form (big-endian, 0x-prefixed) txid of a funding
/// transaction from its revealed serialization pieces.
pub fn funding_txid(
    version: &str,
    input_vector: &str,
    output_vector: &str,
    locktime: &str,
) -> Result<String, FundingTxError> {
    let mut preimage = Vec::new();
    for (name, field) in [
        ("version", version),
        ("inputVector", input_vector),
        ("outputVector", output_vector),
        ("locktime", locktime),
    ] {
        let bytes = hex::decode(field.trim_start_matches("0x"))
            .map_err(|_| FundingTxError::InvalidHex(name))?;
        preimage.extend_from_slice(&bytes);
    }

    let first = Sha256::digest(&preimage);
    let mut txid: [u8; 32] = Sha256::digest(first).into();

    // Internal byte order to display order.
    txid.reverse();
    Ok(format!("0x{}", hex::encode(txid)))
}
