//! Deposit state machine.
//!
//! ```text
//! QUEUED ──▶ INITIALIZED ──▶ FINALIZED ──▶ AWAITING_WORMHOLE_VAA ──▶ BRIDGED
//! ```
//!
//! Each updater checks the exact predecessor status before doing anything;
//! a record in any other status is a debug-logged no-op, which is what makes
//! redundant sweep submissions safe. Transitions persist first, then emit
//! audit events.

use serde_json::json;
use tbtc_relayer_db::traits::DepositStore;
use tbtc_relayer_db::types::{AuditEventType, DepositEntry, DepositStatus};
use tbtc_relayer_primitives::time::now_millis;
use tracing::debug;

use crate::audit::AuditLogger;
use crate::errors::LifecycleResult;

/// What happened to the attempted phase submission.
#[derive(Debug, Clone, Copy)]
pub enum TransitionOutcome<'a> {
    /// The submission confirmed with this transaction hash.
    Confirmed { tx_hash: &'a str },

    /// The submission failed; the status stays put and the error is
    /// recorded for operators.
    Failed { error: &'a str },
}

/// Records a failed attempt without changing status.
pub fn record_deposit_error(
    store: &dyn DepositStore,
    entry: &DepositEntry,
    error: &str,
) -> LifecycleResult<DepositEntry> {
    let mut updated = entry.clone();
    updated.error = Some(error.to_string());
    updated.dates.last_activity_at = now_millis();
    store.update_deposit(&updated)?;
    Ok(updated)
}

/// `QUEUED → INITIALIZED`.
pub fn update_to_initialized(
    store: &dyn DepositStore,
    audit: &AuditLogger,
    entry: &DepositEntry,
    outcome: TransitionOutcome<'_>,
) -> LifecycleResult<DepositEntry> {
    let tx_hash = match outcome {
        TransitionOutcome::Failed { error } => return record_deposit_error(store, entry, error),
        TransitionOutcome::Confirmed { tx_hash } => tx_hash,
    };

    if entry.status != DepositStatus::Queued {
        debug!(
            deposit_id = %entry.id,
            status = %entry.status.as_str(),
            "skipping initialize transition from non-queued status"
        );
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    let now = now_millis();
    updated.status = DepositStatus::Initialized;
    updated.hashes.eth.initialize_tx_hash = Some(tx_hash.to_string());
    updated.dates.initialization_at = Some(now);
    updated.dates.last_activity_at = now;
    updated.error = None;

    store.update_deposit(&updated)?;

    audit.status_change(
        &updated,
        DepositStatus::Queued,
        DepositStatus::Initialized,
        Some(tx_hash),
    );
    audit.deposit_phase(
        AuditEventType::DepositInitialized,
        &updated,
        json!({ "txHash": tx_hash }),
    );
    Ok(updated)
}

/// `INITIALIZED → FINALIZED`.
pub fn update_to_finalized(
    store: &dyn DepositStore,
    audit: &AuditLogger,
    entry: &DepositEntry,
    outcome: TransitionOutcome<'_>,
) -> LifecycleResult<DepositEntry> {
    let tx_hash = match outcome {
        TransitionOutcome::Failed { error } => return record_deposit_error(store, entry, error),
        TransitionOutcome::Confirmed { tx_hash } => tx_hash,
    };

    if entry.status != DepositStatus::Initialized {
        debug!(
            deposit_id = %entry.id,
            status = %entry.status.as_str(),
            "skipping finalize transition from non-initialized status"
        );
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    let now = now_millis();
    updated.status = DepositStatus::Finalized;
    updated.hashes.eth.finalize_tx_hash = Some(tx_hash.to_string());
    updated.dates.finalization_at = Some(now);
    updated.dates.last_activity_at = now;
    updated.error = None;

    store.update_deposit(&updated)?;

    audit.status_change(
        &updated,
        DepositStatus::Initialized,
        DepositStatus::Finalized,
        Some(tx_hash),
    );
    audit.deposit_phase(
        AuditEventType::DepositFinalized,
        &updated,
        json!({ "txHash": tx_hash }),
    );
    Ok(updated)
}

/// `FINALIZED → AWAITING_WORMHOLE_VAA`. Records the transfer sequence the
/// Guardian network will sign over and the L1 transaction that emitted it.
pub fn update_to_awaiting_wormhole_vaa(
    store: &dyn DepositStore,
    audit: &AuditLogger,
    entry: &DepositEntry,
    transfer_sequence: &str,
    wormhole_tx_hash: &str,
) -> LifecycleResult<DepositEntry> {
    if entry.status != DepositStatus::Finalized {
        debug!(
            deposit_id = %entry.id,
            status = %entry.status.as_str(),
            "skipping awaiting-vaa transition from non-finalized status"
        );
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    let now = now_millis();
    updated.status = DepositStatus::AwaitingWormholeVaa;
    updated.wormhole.transfer_sequence = Some(transfer_sequence.to_string());
    updated.wormhole.tx_hash = Some(wormhole_tx_hash.to_string());
    updated.dates.awaiting_wormhole_vaa_message_since = Some(now);
    updated.dates.last_activity_at = now;
    updated.error = None;

    store.update_deposit(&updated)?;

    audit.status_change(
        &updated,
        DepositStatus::Finalized,
        DepositStatus::AwaitingWormholeVaa,
        Some(wormhole_tx_hash),
    );
    audit.deposit_phase(
        AuditEventType::DepositAwaitingWormholeVaa,
        &updated,
        json!({
            "transferSequence": transfer_sequence,
            "txHash": wormhole_tx_hash,
        }),
    );
    Ok(updated)
}

/// `AWAITING_WORMHOLE_VAA → BRIDGED`.
pub fn update_to_bridged(
    store: &dyn DepositStore,
    audit: &AuditLogger,
    entry: &DepositEntry,
    outcome: TransitionOutcome<'_>,
) -> LifecycleResult<DepositEntry> {
    let tx_hash = match outcome {
        TransitionOutcome::Failed { error } => return record_deposit_error(store, entry, error),
        TransitionOutcome::Confirmed { tx_hash } => tx_hash,
    };

    if entry.status != DepositStatus::AwaitingWormholeVaa {
        debug!(
            deposit_id = %entry.id,
            status = %entry.status.as_str(),
            "skipping bridged transition from non-awaiting status"
        );
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    let now = now_millis();
    updated.status = DepositStatus::Bridged;
    updated.hashes.solana.bridge_tx_hash = Some(tx_hash.to_string());
    updated.wormhole.bridging_attempted = true;
    updated.dates.bridged_at = Some(now);
    updated.dates.last_activity_at = now;
    updated.error = None;

    store.update_deposit(&updated)?;

    audit.status_change(
        &updated,
        DepositStatus::AwaitingWormholeVaa,
        DepositStatus::Bridged,
        Some(tx_hash),
    );
    audit.deposit_phase(
        AuditEventType::DepositBridged,
        &updated,
        json!({ "txHash": tx_hash }),
    );
    Ok(updated)
}
