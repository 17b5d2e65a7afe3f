//! Redemption state machine and sweep.
//!
//! ```text
//! PENDING ──▶ VAA_FETCHED ──▶ COMPLETED
//!    │              │
//!    ▼              ▼
//! VAA_FAILED      FAILED
//! ```
//!
//! Redemptions carry their own human-readable `logs` list; journal-level
//! audit events are emitted only for operator-facing errors.

use std::sync::Arc;

use async_trait::async_trait;
use tbtc_relayer_chains::{ChainError, ChainResult, TxReceipt};
use tbtc_relayer_db::traits::RedemptionStore;
use tbtc_relayer_db::types::{RedemptionEntry, RedemptionStatus, VaaStatus};
use tbtc_relayer_primitives::time::now_millis;
use tracing::{debug, info, warn};

use crate::audit::AuditLogger;
use crate::errors::LifecycleResult;

/// Ingests a `RedemptionRequested` event observed by a chain listener. A
/// re-observed event (listener replay, past-scan overlap) returns the
/// tracked record untouched.
pub fn record_redemption_request(
    store: &dyn RedemptionStore,
    chain_name: &str,
    event: tbtc_relayer_db::types::RedemptionRequestedEvent,
) -> LifecycleResult<RedemptionEntry> {
    let id = RedemptionEntry::derive_id(chain_name, &event.l2_transaction_hash);
    if let Some(existing) = store.get_redemption(&id)? {
        debug!(redemption_id = %id, "redemption already tracked");
        return Ok(existing);
    }

    let mut entry = RedemptionEntry::new_pending(chain_name.to_string(), event);
    entry.push_log("redemption request observed".to_string());
    store.create_redemption(&entry)?;
    info!(redemption_id = %entry.id, chain = %chain_name, "redemption tracked");
    Ok(entry)
}

/// Records a failed attempt without changing status.
pub fn record_redemption_error(
    store: &dyn RedemptionStore,
    entry: &RedemptionEntry,
    error: &str,
) -> LifecycleResult<RedemptionEntry> {
    let mut updated = entry.clone();
    updated.error = Some(error.to_string());
    updated.dates.last_activity_at = now_millis();
    store.update_redemption(&updated)?;
    Ok(updated)
}

/// Records a failed VAA retrieval attempt, bumping the attempt counter.
pub fn record_vaa_attempt_failure(
    store: &dyn RedemptionStore,
    entry: &RedemptionEntry,
    error: &str,
) -> LifecycleResult<RedemptionEntry> {
    let mut updated = entry.clone();
    updated.vaa_fetch_attempts += 1;
    updated.error = Some(error.to_string());
    updated.dates.last_activity_at = now_millis();
    updated.push_log(format!(
        "VAA fetch attempt {} failed: {error}",
        updated.vaa_fetch_attempts
    ));
    store.update_redemption(&updated)?;
    Ok(updated)
}

/// `PENDING → VAA_FETCHED`.
pub fn update_to_vaa_fetched(
    store: &dyn RedemptionStore,
    entry: &RedemptionEntry,
    vaa_bytes: Vec<u8>,
) -> LifecycleResult<RedemptionEntry> {
    if entry.status != RedemptionStatus::Pending {
        debug!(
            redemption_id = %entry.id,
            status = %entry.status.as_str(),
            "skipping vaa-fetched transition from non-pending status"
        );
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    let now = now_millis();
    updated.status = RedemptionStatus::VaaFetched;
    updated.vaa_status = VaaStatus::Fetched;
    updated.push_log(format!("VAA fetched and verified ({} bytes)", vaa_bytes.len()));
    updated.vaa_bytes = Some(vaa_bytes);
    updated.dates.vaa_fetched_at = Some(now);
    updated.dates.last_activity_at = now;
    updated.error = None;

    store.update_redemption(&updated)?;
    Ok(updated)
}

/// `VAA_FETCHED → COMPLETED`.
pub fn update_to_completed(
    store: &dyn RedemptionStore,
    entry: &RedemptionEntry,
    l1_tx_hash: &str,
) -> LifecycleResult<RedemptionEntry> {
    if entry.status != RedemptionStatus::VaaFetched {
        debug!(
            redemption_id = %entry.id,
            status = %entry.status.as_str(),
            "skipping completed transition from non-vaa-fetched status"
        );
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    let now = now_millis();
    updated.status = RedemptionStatus::Completed;
    updated.l1_submission_tx_hash = Some(l1_tx_hash.to_string());
    updated.dates.l1_submitted_at = Some(now);
    updated.dates.completed_at = Some(now);
    updated.dates.last_activity_at = now;
    updated.push_log(format!("L1 submission confirmed in {l1_tx_hash}"));
    updated.error = None;

    store.update_redemption(&updated)?;
    Ok(updated)
}

/// Terminal: the VAA could not be retrieved within the attempt budget.
pub fn update_to_vaa_failed(
    store: &dyn RedemptionStore,
    audit: &AuditLogger,
    entry: &RedemptionEntry,
    error: &str,
) -> LifecycleResult<RedemptionEntry> {
    if entry.status != RedemptionStatus::Pending {
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    updated.status = RedemptionStatus::VaaFailed;
    updated.vaa_status = VaaStatus::Failed;
    updated.error = Some(error.to_string());
    updated.dates.last_activity_at = now_millis();
    updated.push_log(format!("giving up on VAA retrieval: {error}"));

    store.update_redemption(&updated)?;
    audit.operational_error(
        Some(updated.chain_name.as_str()),
        None,
        "REDEMPTION_VAA_FAILED",
        error,
    );
    Ok(updated)
}

/// Terminal: the L1 submission was refused.
pub fn update_to_failed(
    store: &dyn RedemptionStore,
    audit: &AuditLogger,
    entry: &RedemptionEntry,
    error: &str,
) -> LifecycleResult<RedemptionEntry> {
    if entry.status.is_terminal() {
        return Ok(entry.clone());
    }

    let mut updated = entry.clone();
    updated.status = RedemptionStatus::Failed;
    updated.error = Some(error.to_string());
    updated.dates.last_activity_at = now_millis();
    updated.push_log(format!("L1 submission failed: {error}"));

    store.update_redemption(&updated)?;
    audit.operational_error(
        Some(updated.chain_name.as_str()),
        None,
        "REDEMPTION_FAILED",
        error,
    );
    Ok(updated)
}

/// Source of verified VAA bytes for a redemption. Implemented over the VAA
/// service by the composition root; faked in tests.
#[async_trait]
pub trait RedemptionVaaSource: Send + Sync {
    /// Returns verified wire bytes, or `None` if retrieval or verification
    /// failed (already logged by the implementation).
    async fn fetch_vaa(&self, redemption: &RedemptionEntry) -> Option<Vec<u8>>;
}

/// Submits the verified VAA to the L1 bridge contract.
#[async_trait]
pub trait RedemptionSubmitter: Send + Sync {
    async fn submit_redemption(&self, redemption: &RedemptionEntry) -> ChainResult<TxReceipt>;
}

/// Sweeps one chain's redemptions: fetches VAAs for `Pending` entries, then
/// submits `VaaFetched` entries to L1. Chain handlers call this from their
/// `process_redemptions` hook.
pub struct RedemptionProcessor {
    store: Arc<dyn RedemptionStore>,
    audit: AuditLogger,
    vaa_source: Arc<dyn RedemptionVaaSource>,
    submitter: Arc<dyn RedemptionSubmitter>,
    chain_name: String,
    /// VAA retrieval attempts before a redemption moves to `VaaFailed`.
    /// Zero retries indefinitely.
    max_vaa_attempts: u32,
}

impl RedemptionProcessor {
    pub fn new(
        store: Arc<dyn RedemptionStore>,
        audit: AuditLogger,
        vaa_source: Arc<dyn RedemptionVaaSource>,
        submitter: Arc<dyn RedemptionSubmitter>,
        chain_name: String,
        max_vaa_attempts: u32,
    ) -> Self {
        Self {
            store,
            audit,
            vaa_source,
            submitter,
            chain_name,
            max_vaa_attempts,
        }
    }

    pub async fn run(&self) -> LifecycleResult<()> {
        self.fetch_pending_vaas().await?;
        self.submit_fetched().await?;
        Ok(())
    }

    async fn fetch_pending_vaas(&self) -> LifecycleResult<()> {
        let pending = self
            .store
            .get_redemptions_by_status(RedemptionStatus::Pending, Some(self.chain_name.as_str()))?;

        for entry in pending {
            match self.vaa_source.fetch_vaa(&entry).await {
                Some(bytes) => {
                    info!(redemption_id = %entry.id, "VAA fetched");
                    update_to_vaa_fetched(&*self.store, &entry, bytes)?;
                }
                None => {
                    let attempted = record_vaa_attempt_failure(
                        &*self.store,
                        &entry,
                        "VAA retrieval failed",
                    )?;
                    self.audit.operational_error(
                        Some(self.chain_name.as_str()),
                        None,
                        "VAA_FETCH_FAILED",
                        &format!(
                            "redemption {} attempt {}",
                            attempted.id, attempted.vaa_fetch_attempts
                        ),
                    );
                    if self.max_vaa_attempts > 0
                        && attempted.vaa_fetch_attempts >= self.max_vaa_attempts
                    {
                        warn!(
                            redemption_id = %attempted.id,
                            attempts = attempted.vaa_fetch_attempts,
                            "VAA attempt budget exhausted"
                        );
                        update_to_vaa_failed(
                            &*self.store,
                            &self.audit,
                            &attempted,
                            "VAA retrieval attempt budget exhausted",
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn submit_fetched(&self) -> LifecycleResult<()> {
        let fetched = self
            .store
            .get_redemptions_by_status(RedemptionStatus::VaaFetched, Some(self.chain_name.as_str()))?;

        for entry in fetched {
            match self.submitter.submit_redemption(&entry).await {
                Ok(receipt) => {
                    info!(
                        redemption_id = %entry.id,
                        tx = %receipt.transaction_hash,
                        "redemption completed on L1"
                    );
                    update_to_completed(&*self.store, &entry, &receipt.transaction_hash)?;
                }
                Err(e) if e.is_retryable() => {
                    record_redemption_error(&*self.store, &entry, &e.to_string())?;
                }
                Err(ChainError::AlreadyCompleted) => {
                    // The bridge contract saw this VAA already; the transfer
                    // is done even though we never observed our own receipt.
                    update_to_completed(&*self.store, &entry, "0x0")?;
                }
                Err(e) => {
                    update_to_failed(&*self.store, &self.audit, &entry, &e.to_string())?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tbtc_relayer_db::types::RedemptionRequestedEvent;
    use tbtc_relayer_db::MemoryDb;

    use super::*;

    fn entry(chain: &str, tx: &str) -> RedemptionEntry {
        RedemptionEntry::new_pending(
            chain.into(),
            RedemptionRequestedEvent {
                l2_transaction_hash: tx.into(),
                amount: "5000".into(),
                ..Default::default()
            },
        )
    }

    struct ScriptedVaaSource(Mutex<Vec<Option<Vec<u8>>>>);

    #[async_trait]
    impl RedemptionVaaSource for ScriptedVaaSource {
        async fn fetch_vaa(&self, _redemption: &RedemptionEntry) -> Option<Vec<u8>> {
            self.0.lock().pop().unwrap_or(None)
        }
    }

    struct ScriptedSubmitter(Mutex<Vec<ChainResult<TxReceipt>>>);

    #[async_trait]
    impl RedemptionSubmitter for ScriptedSubmitter {
        async fn submit_redemption(
            &self,
            _redemption: &RedemptionEntry,
        ) -> ChainResult<TxReceipt> {
            self.0
                .lock()
                .pop()
                .unwrap_or(Err(ChainError::Rpc("unscripted".into())))
        }
    }

    fn processor(
        db: Arc<MemoryDb>,
        vaa: Vec<Option<Vec<u8>>>,
        submits: Vec<ChainResult<TxReceipt>>,
        max_attempts: u32,
    ) -> RedemptionProcessor {
        RedemptionProcessor::new(
            db.clone(),
            AuditLogger::new(db),
            Arc::new(ScriptedVaaSource(Mutex::new(vaa))),
            Arc::new(ScriptedSubmitter(Mutex::new(submits))),
            "SolanaDevnet".into(),
            max_attempts,
        )
    }

    #[test]
    fn request_ingestion_is_idempotent() {
        let db = Arc::new(MemoryDb::new());
        let event = RedemptionRequestedEvent {
            l2_transaction_hash: "0xabc".into(),
            amount: "5000".into(),
            ..Default::default()
        };

        let first = record_redemption_request(&*db, "SolanaDevnet", event.clone()).unwrap();
        assert_eq!(first.status, RedemptionStatus::Pending);

        // Advance it, then replay the event: the tracked record wins.
        let advanced = update_to_vaa_fetched(&*db, &first, vec![1]).unwrap();
        let replayed = record_redemption_request(&*db, "SolanaDevnet", event).unwrap();
        assert_eq!(replayed, advanced);
    }

    #[tokio::test]
    async fn pending_to_completed_in_one_sweep() {
        let db = Arc::new(MemoryDb::new());
        let e = entry("SolanaDevnet", "0xabc");
        db.create_redemption(&e).unwrap();

        let p = processor(
            db.clone(),
            vec![Some(vec![1, 2, 3])],
            vec![Ok(TxReceipt {
                transaction_hash: "0xl1".into(),
                status: 1,
            })],
            0,
        );
        p.run().await.unwrap();

        let stored = db.get_redemption(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::Completed);
        assert_eq!(stored.vaa_bytes.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(stored.l1_submission_tx_hash.as_deref(), Some("0xl1"));
        assert!(stored.dates.completed_at.is_some());
    }

    #[tokio::test]
    async fn vaa_failures_stay_pending_until_budget_exhausted() {
        let db = Arc::new(MemoryDb::new());
        let e = entry("SolanaDevnet", "0xabc");
        db.create_redemption(&e).unwrap();

        let p = processor(db.clone(), vec![None], vec![], 2);
        p.run().await.unwrap();

        let stored = db.get_redemption(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::Pending);
        assert_eq!(stored.vaa_fetch_attempts, 1);

        let p = processor(db.clone(), vec![None], vec![], 2);
        p.run().await.unwrap();

        let stored = db.get_redemption(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::VaaFailed);
        assert_eq!(stored.vaa_status, VaaStatus::Failed);
    }

    #[tokio::test]
    async fn unbounded_budget_retries_forever() {
        let db = Arc::new(MemoryDb::new());
        let e = entry("SolanaDevnet", "0xabc");
        db.create_redemption(&e).unwrap();

        for _ in 0..5 {
            let p = processor(db.clone(), vec![None], vec![], 0);
            p.run().await.unwrap();
        }

        let stored = db.get_redemption(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::Pending);
        assert_eq!(stored.vaa_fetch_attempts, 5);
    }

    #[tokio::test]
    async fn refused_submission_is_terminal_failure() {
        let db = Arc::new(MemoryDb::new());
        let mut e = entry("SolanaDevnet", "0xabc");
        e.status = RedemptionStatus::VaaFetched;
        e.vaa_bytes = Some(vec![9]);
        db.create_redemption(&e).unwrap();

        let p = processor(
            db.clone(),
            vec![],
            vec![Err(ChainError::Refused("bad script".into()))],
            0,
        );
        p.run().await.unwrap();

        let stored = db.get_redemption(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::Failed);
        assert!(stored.error.as_deref().unwrap().contains("bad script"));
    }

    #[tokio::test]
    async fn transient_submission_failure_is_retried() {
        let db = Arc::new(MemoryDb::new());
        let mut e = entry("SolanaDevnet", "0xabc");
        e.status = RedemptionStatus::VaaFetched;
        e.vaa_bytes = Some(vec![9]);
        db.create_redemption(&e).unwrap();

        let p = processor(
            db.clone(),
            vec![],
            vec![Err(ChainError::Rpc("429".into()))],
            0,
        );
        p.run().await.unwrap();

        let stored = db.get_redemption(&e.id).unwrap().unwrap();
        assert_eq!(stored.status, RedemptionStatus::VaaFetched);
        assert!(stored.error.as_deref().unwrap().contains("429"));
    }
}
