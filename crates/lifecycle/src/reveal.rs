//! Strict validation of the ingress reveal payload.
//!
//! Malformed payloads are rejected wholesale with one [`FieldError`] per
//! offending field; nothing is persisted for a rejected reveal.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tbtc_relayer_db::types::{DepositReceipt, FundingTransaction, L1OutputEvent, Reveal};
use tbtc_relayer_primitives::btc::funding_txid;

use crate::errors::FieldError;

/// The reveal payload as received from ingress. `fundingOutputIndex` is
/// accepted as a signed 64-bit value so out-of-range inputs fail validation
/// with a structured error instead of a deserialization error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealRequest {
    pub funding_tx: FundingTransaction,
    pub reveal: RevealPayload,
    pub l2_deposit_owner: String,
    pub l2_sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealPayload {
    pub funding_output_index: i64,
    pub blinding_factor: String,
    pub wallet_public_key_hash: String,
    pub refund_public_key_hash: String,
    pub refund_locktime: String,
    pub vault: Option<String>,
}

/// A reveal that passed validation, with the derived funding txid.
#[derive(Debug, Clone)]
pub struct ValidatedReveal {
    pub funding_tx_hash: String,
    pub funding_output_index: u32,
    pub receipt: DepositReceipt,
    pub l1_output_event: L1OutputEvent,
}

fn is_hex_field(value: &str) -> bool {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    !stripped.is_empty() && stripped.len() % 2 == 0 && stripped.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_hex_of_len(value: &str, bytes: usize) -> bool {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    stripped.len() == bytes * 2 && stripped.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_eth_address(value: &str) -> bool {
    value.parse::<Address>().is_ok()
}

/// Validates every field, collecting all offenders rather than stopping at
/// the first.
pub fn validate(req: &RevealRequest) -> Result<ValidatedReveal, Vec<FieldError>> {
    let mut errors = Vec::new();

    for (name, value) in [
        ("fundingTx.version", &req.funding_tx.version),
        ("fundingTx.inputVector", &req.funding_tx.input_vector),
        ("fundingTx.outputVector", &req.funding_tx.output_vector),
        ("fundingTx.locktime", &req.funding_tx.locktime),
    ] {
        if !is_hex_field(value) {
            errors.push(FieldError::new(name, "must be a hex string"));
        }
    }

    let index = u32::try_from(req.reveal.funding_output_index);
    if index.is_err() {
        errors.push(FieldError::new(
            "reveal.fundingOutputIndex",
            "must be a non-negative integer at most 4294967295",
        ));
    }

    if !is_hex_field(&req.reveal.blinding_factor) {
        errors.push(FieldError::new(
            "reveal.blindingFactor",
            "must be a hex string",
        ));
    }
    if !is_hex_of_len(&req.reveal.wallet_public_key_hash, 20) {
        errors.push(FieldError::new(
            "reveal.walletPubKeyHash",
            "must be a 20-byte hex string",
        ));
    }
    if !is_hex_of_len(&req.reveal.refund_public_key_hash, 20) {
        errors.push(FieldError::new(
            "reveal.refundPubKeyHash",
            "must be a 20-byte hex string",
        ));
    }
    if req.reveal.refund_locktime.is_empty()
        || !req.reveal.refund_locktime.bytes().all(|b| b.is_ascii_digit())
    {
        errors.push(FieldError::new(
            "reveal.refundLocktime",
            "must be a numeric string",
        ));
    }
    if let Some(vault) = &req.reveal.vault {
        if !is_eth_address(vault) {
            errors.push(FieldError::new("reveal.vault", "must be an Ethereum address"));
        }
    }

    if !is_eth_address(&req.l2_deposit_owner) {
        errors.push(FieldError::new(
            "l2DepositOwner",
            "must be an Ethereum address",
        ));
    }
    if !is_eth_address(&req.l2_sender) {
        errors.push(FieldError::new("l2Sender", "must be an Ethereum address"));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // All fields are individually valid; the txid derivation can only fail
    // on hex errors already excluded above.
    let funding_tx_hash = funding_txid(
        &req.funding_tx.version,
        &req.funding_tx.input_vector,
        &req.funding_tx.output_vector,
        &req.funding_tx.locktime,
    )
    .map_err(|e| vec![FieldError::new("fundingTx", e.to_string())])?;

    let funding_output_index = index.expect("range checked above");

    Ok(ValidatedReveal {
        funding_tx_hash,
        funding_output_index,
        receipt: DepositReceipt {
            depositor: req.l2_sender.clone(),
            blinding_factor: req.reveal.blinding_factor.clone(),
            wallet_public_key_hash: req.reveal.wallet_public_key_hash.clone(),
            refund_public_key_hash: req.reveal.refund_public_key_hash.clone(),
            refund_locktime: req.reveal.refund_locktime.clone(),
            extra_data: None,
        },
        l1_output_event: L1OutputEvent {
            funding_tx: req.funding_tx.clone(),
            reveal: Reveal {
                funding_output_index,
                blinding_factor: req.reveal.blinding_factor.clone(),
                wallet_public_key_hash: req.reveal.wallet_public_key_hash.clone(),
                refund_public_key_hash: req.reveal.refund_public_key_hash.clone(),
                refund_locktime: req.reveal.refund_locktime.clone(),
                vault: req.reveal.vault.clone(),
            },
            l2_deposit_owner: req.l2_deposit_owner.clone(),
            l2_sender: req.l2_sender.clone(),
        },
    })
}
