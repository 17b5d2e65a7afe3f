//! In-memory store implementation. Backs the test suites and documents the
//! expected backend semantics (duplicate-create warning, absent-delete
//! no-op, unordered status scans).

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::warn;

use crate::errors::{DbError, DbResult};
use crate::traits::{AuditLogStore, DepositStore, RedemptionStore};
use crate::types::{
    AuditEvent, AuditFilter, DepositEntry, DepositStatus, NewAuditEvent, RedemptionEntry,
    RedemptionStatus,
};

/// All three stores over process-local maps.
#[derive(Debug, Default)]
pub struct MemoryDb {
    deposits: Mutex<BTreeMap<String, DepositEntry>>,
    redemptions: Mutex<BTreeMap<String, RedemptionEntry>>,
    audit: Mutex<Vec<AuditEvent>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DepositStore for MemoryDb {
    fn create_deposit(&self, entry: &DepositEntry) -> DbResult<()> {
        let mut deposits = self.deposits.lock();
        if deposits.contains_key(&entry.id) {
            warn!(deposit_id = %entry.id, "deposit already exists, keeping stored record");
            return Ok(());
        }
        deposits.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn update_deposit(&self, entry: &DepositEntry) -> DbResult<()> {
        let mut deposits = self.deposits.lock();
        if !deposits.contains_key(&entry.id) {
            return Err(DbError::NotFound(entry.id.clone()));
        }
        deposits.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn get_deposit(&self, id: &str) -> DbResult<Option<DepositEntry>> {
        Ok(self.deposits.lock().get(id).cloned())
    }

    fn get_deposits_by_status(
        &self,
        status: DepositStatus,
        chain_name: Option<&str>,
    ) -> DbResult<Vec<DepositEntry>> {
        Ok(self
            .deposits
            .lock()
            .values()
            .filter(|e| e.status == status)
            .filter(|e| chain_name.map_or(true, |c| e.chain_name == c))
            .cloned()
            .collect())
    }

    fn delete_deposit(&self, id: &str) -> DbResult<()> {
        self.deposits.lock().remove(id);
        Ok(())
    }
}

impl RedemptionStore for MemoryDb {
    fn create_redemption(&self, entry: &RedemptionEntry) -> DbResult<()> {
        let mut redemptions = self.redemptions.lock();
        if redemptions.contains_key(&entry.id) {
            warn!(redemption_id = %entry.id, "redemption already exists, keeping stored record");
            return Ok(());
        }
        redemptions.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn update_redemption(&self, entry: &RedemptionEntry) -> DbResult<()> {
        let mut redemptions = self.redemptions.lock();
        if !redemptions.contains_key(&entry.id) {
            return Err(DbError::NotFound(entry.id.clone()));
        }
        redemptions.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn get_redemption(&self, id: &str) -> DbResult<Option<RedemptionEntry>> {
        Ok(self.redemptions.lock().get(id).cloned())
    }

    fn get_redemptions_by_status(
        &self,
        status: RedemptionStatus,
        chain_name: Option<&str>,
    ) -> DbResult<Vec<RedemptionEntry>> {
        Ok(self
            .redemptions
            .lock()
            .values()
            .filter(|e| e.status == status)
            .filter(|e| chain_name.map_or(true, |c| e.chain_name == c))
            .cloned()
            .collect())
    }

    fn delete_redemption(&self, id: &str) -> DbResult<()> {
        self.redemptions.lock().remove(id);
        Ok(())
    }
}

impl AuditLogStore for MemoryDb {
    fn append_event(&self, event: NewAuditEvent) -> DbResult<u64> {
        let mut audit = self.audit.lock();
        let id = audit.len() as u64;
        audit.push(AuditEvent { id, event });
        Ok(id)
    }

    fn get_events(&self, filter: &AuditFilter) -> DbResult<Vec<AuditEvent>> {
        Ok(self
            .audit
            .lock()
            .iter()
            .filter(|e| filter.matches(&e.event))
            .cloned()
            .collect())
    }
}
