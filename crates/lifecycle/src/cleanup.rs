//! Age-based deletion of terminal and abandoned deposits.
//!
//! Each sweep is parameterized by a [`CleanupPolicy`]; the scheduler runs
//! one policy per eligible status. Deletion is best-effort per record: a
//! failing record never aborts the sweep, only a failing status scan does.

use tbtc_relayer_db::traits::DepositStore;
use tbtc_relayer_db::types::{DepositDateField, DepositStatus};
use tbtc_relayer_primitives::time::{age_hours, now_millis};
use tracing::{debug, error, info};

use crate::audit::AuditLogger;
use crate::errors::LifecycleResult;

/// One status's retention rule.
#[derive(Debug, Clone, Copy)]
pub struct CleanupPolicy {
    pub status: DepositStatus,
    pub date_field: DepositDateField,
    pub threshold_hours: u64,
}

impl CleanupPolicy {
    /// Abandoned reveals that never initialized.
    pub fn queued(threshold_hours: u64) -> Self {
        Self {
            status: DepositStatus::Queued,
            date_field: DepositDateField::CreatedAt,
            threshold_hours,
        }
    }

    /// Finalized deposits with no bridging leg left to run.
    pub fn finalized(threshold_hours: u64) -> Self {
        Self {
            status: DepositStatus::Finalized,
            date_field: DepositDateField::FinalizationAt,
            threshold_hours,
        }
    }

    /// Fully bridged deposits.
    pub fn bridged(threshold_hours: u64) -> Self {
        Self {
            status: DepositStatus::Bridged,
            date_field: DepositDateField::BridgedAt,
            threshold_hours,
        }
    }
}

/// Counters reported back to the scheduler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanupStats {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Sweeps one policy. A failure listing the candidates is fatal for the
/// sweep and returned to the caller; everything after that is per-record
/// best-effort.
pub fn run_cleanup(
    store: &dyn DepositStore,
    audit: &AuditLogger,
    policy: CleanupPolicy,
) -> LifecycleResult<CleanupStats> {
    let now = now_millis();
    let candidates = store.get_deposits_by_status(policy.status, None)?;

    let mut stats = CleanupStats {
        scanned: candidates.len(),
        ..Default::default()
    };

    for listed in candidates {
        let Some(then) = listed.date_field(policy.date_field) else {
            debug!(deposit_id = %listed.id, "skipping record with unset date field");
            continue;
        };

        let age = age_hours(now, then);
        if age <= policy.threshold_hours as f64 {
            continue;
        }

        // Re-read in case the record moved since the scan; a missing record
        // still goes through the delete, which is a no-op.
        let current = match store.get_deposit(&listed.id) {
            Ok(found) => found.unwrap_or(listed),
            Err(e) => {
                error!(deposit_id = %listed.id, err = %e, "could not re-read record, skipping");
                stats.failed += 1;
                continue;
            }
        };

        let reason = format!(
            "{} deposit exceeded age limit of {}h (age: {:.2}h)",
            policy.status.as_str(),
            policy.threshold_hours,
            age
        );
        audit.deposit_deleted(&current, &reason);

        match store.delete_deposit(&current.id) {
            Ok(()) => {
                info!(
                    deposit_id = %current.id,
                    chain = %current.chain_name,
                    status = %policy.status.as_str(),
                    age_hours = %format_args!("{age:.2}"),
                    "deleted aged deposit"
                );
                stats.deleted += 1;
            }
            Err(e) => {
                error!(deposit_id = %current.id, err = %e, "could not delete aged deposit");
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tbtc_relayer_db::traits::AuditLogStore;
    use tbtc_relayer_db::types::{
        AuditEventType, AuditFilter, DepositEntry, DepositReceipt,
    };
    use tbtc_relayer_db::MemoryDb;
    use tbtc_relayer_primitives::time::MILLIS_PER_HOUR;

    use super::*;

    fn aged_deposit(id: &str, status: DepositStatus, age_hours: u64) -> DepositEntry {
        let mut e = DepositEntry::new_queued(
            id.into(),
            "Base".into(),
            "0xbtc".into(),
            0,
            "0xowner".into(),
            DepositReceipt::default(),
            None,
        );
        let then = now_millis() - age_hours * MILLIS_PER_HOUR;
        e.status = status;
        e.dates.created_at = then;
        if status >= DepositStatus::Finalized {
            e.dates.finalization_at = Some(then);
        }
        if status == DepositStatus::Bridged {
            e.dates.bridged_at = Some(then);
        }
        e
    }

    #[test]
    fn deletes_queued_past_threshold_with_audit_reason() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());
        db.create_deposit(&aged_deposit("old", DepositStatus::Queued, 52))
            .unwrap();

        let stats = run_cleanup(&*db, &audit, CleanupPolicy::queued(48)).unwrap();
        assert_eq!(stats.deleted, 1);
        assert!(db.get_deposit("old").unwrap().is_none());

        let deleted_events = db
            .get_events(&AuditFilter {
                event_type: Some(AuditEventType::DepositDeleted),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(deleted_events.len(), 1);
        let reason = deleted_events[0].event.data["reason"].as_str().unwrap();
        assert!(reason.contains("QUEUED deposit exceeded age limit"));
        assert!(reason.contains("52.00"));
    }

    #[test]
    fn keeps_records_under_threshold() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());
        db.create_deposit(&aged_deposit("young", DepositStatus::Queued, 40))
            .unwrap();

        let stats = run_cleanup(&*db, &audit, CleanupPolicy::queued(48)).unwrap();
        assert_eq!(stats.deleted, 0);
        assert!(db.get_deposit("young").unwrap().is_some());
        assert!(db
            .get_events(&AuditFilter {
                event_type: Some(AuditEventType::DepositDeleted),
                ..Default::default()
            })
            .unwrap()
            .is_empty());
    }

    #[test]
    fn zero_threshold_deletes_anything_older_than_now() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());
        db.create_deposit(&aged_deposit("any", DepositStatus::Queued, 1))
            .unwrap();

        let stats = run_cleanup(&*db, &audit, CleanupPolicy::queued(0)).unwrap();
        assert_eq!(stats.deleted, 1);
    }

    #[test]
    fn unset_date_field_is_skipped() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());

        // Finalized status but finalization_at unset; cannot be aged.
        let mut e = aged_deposit("odd", DepositStatus::Finalized, 100);
        e.dates.finalization_at = None;
        db.create_deposit(&e).unwrap();

        let stats = run_cleanup(&*db, &audit, CleanupPolicy::finalized(12)).unwrap();
        assert_eq!(stats.deleted, 0);
        assert!(db.get_deposit("odd").unwrap().is_some());
    }

    #[test]
    fn only_the_policy_status_is_touched() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());
        db.create_deposit(&aged_deposit("queued", DepositStatus::Queued, 100))
            .unwrap();
        db.create_deposit(&aged_deposit("initialized", DepositStatus::Initialized, 100))
            .unwrap();
        db.create_deposit(&aged_deposit("bridged", DepositStatus::Bridged, 100))
            .unwrap();

        run_cleanup(&*db, &audit, CleanupPolicy::queued(48)).unwrap();

        assert!(db.get_deposit("queued").unwrap().is_none());
        assert!(db.get_deposit("initialized").unwrap().is_some());
        assert!(db.get_deposit("bridged").unwrap().is_some());
    }

    #[test]
    fn bridged_policy_uses_bridged_at() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());
        db.create_deposit(&aged_deposit("b", DepositStatus::Bridged, 13))
            .unwrap();

        let stats = run_cleanup(&*db, &audit, CleanupPolicy::bridged(12)).unwrap();
        assert_eq!(stats.deleted, 1);
    }
}
