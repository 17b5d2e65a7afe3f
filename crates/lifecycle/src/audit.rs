//! Audit journal emission. Appends are best-effort: a failed append is
//! logged and swallowed so it can never revert or block a persisted
//! transition.

use std::sync::Arc;

use serde_json::json;
use tbtc_relayer_db::traits::AuditLogStore;
use tbtc_relayer_db::types::{
    AuditEventType, DepositEntry, DepositStatus, NewAuditEvent,
};
use tbtc_relayer_primitives::time::now_millis;
use tracing::error;

#[derive(Clone)]
pub struct AuditLogger {
    store: Arc<dyn AuditLogStore>,
}

impl AuditLogger {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// Appends an event; failures are logged and swallowed.
    pub fn log(&self, event: NewAuditEvent) {
        if let Err(e) = self.store.append_event(event.clone()) {
            error!(err = %e, event_type = ?event.event_type, "could not append audit event");
        }
    }

    pub fn deposit_created(&self, entry: &DepositEntry) {
        self.log(NewAuditEvent {
            timestamp: now_millis(),
            event_type: AuditEventType::DepositCreated,
            deposit_id: Some(entry.id.clone()),
            chain_name: Some(entry.chain_name.clone()),
            data: json!({
                "fundingTxHash": entry.funding_tx_hash,
                "fundingOutputIndex": entry.funding_output_index,
                "owner": entry.owner,
            }),
            error_code: None,
        });
    }

    pub fn status_change(
        &self,
        entry: &DepositEntry,
        from: DepositStatus,
        to: DepositStatus,
        tx_hash: Option<&str>,
    ) {
        self.log(NewAuditEvent {
            timestamp: now_millis(),
            event_type: AuditEventType::StatusChange,
            deposit_id: Some(entry.id.clone()),
            chain_name: Some(entry.chain_name.clone()),
            data: json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "txHash": tx_hash,
            }),
            error_code: None,
        });
    }

    /// Phase marker (DEPOSIT_INITIALIZED and friends) with a free-form
    /// payload.
    pub fn deposit_phase(
        &self,
        event_type: AuditEventType,
        entry: &DepositEntry,
        data: serde_json::Value,
    ) {
        self.log(NewAuditEvent {
            timestamp: now_millis(),
            event_type,
            deposit_id: Some(entry.id.clone()),
            chain_name: Some(entry.chain_name.clone()),
            data,
            error_code: None,
        });
    }

    pub fn deposit_deleted(&self, entry: &DepositEntry, reason: &str) {
        self.log(NewAuditEvent {
            timestamp: now_millis(),
            event_type: AuditEventType::DepositDeleted,
            deposit_id: Some(entry.id.clone()),
            chain_name: Some(entry.chain_name.clone()),
            data: json!({ "reason": reason }),
            error_code: None,
        });
    }

    pub fn api_request(&self, chain_name: &str, endpoint: &str, deposit_id: Option<&str>) {
        self.log(NewAuditEvent {
            timestamp: now_millis(),
            event_type: AuditEventType::ApiRequest,
            deposit_id: deposit_id.map(str::to_string),
            chain_name: Some(chain_name.to_string()),
            data: json!({ "endpoint": endpoint }),
            error_code: None,
        });
    }

    pub fn operational_error(
        &self,
        chain_name: Option<&str>,
        deposit_id: Option<&str>,
        error_code: &str,
        message: &str,
    ) {
        self.log(NewAuditEvent {
            timestamp: now_millis(),
            event_type: AuditEventType::Error,
            deposit_id: deposit_id.map(str::to_string),
            chain_name: chain_name.map(str::to_string),
            data: json!({ "message": message }),
            error_code: Some(error_code.to_string()),
        });
    }
}

#[cfg(test)]
mod tests {
    use tbtc_relayer_db::traits::DepositStore;
    use tbtc_relayer_db::types::{AuditFilter, DepositReceipt};
    use tbtc_relayer_db::MemoryDb;

    use super::*;

    fn entry() -> DepositEntry {
        DepositEntry::new_queued(
            "7".into(),
            "Base".into(),
            "0xbtc".into(),
            1,
            "0xowner".into(),
            DepositReceipt::default(),
            None,
        )
    }

    #[test]
    fn status_change_payload_names_both_ends() {
        let db = Arc::new(MemoryDb::new());
        db.create_deposit(&entry()).unwrap();
        let audit = AuditLogger::new(db.clone());

        audit.status_change(
            &entry(),
            DepositStatus::Queued,
            DepositStatus::Initialized,
            Some("0xaa"),
        );

        let events = db.get_events(&AuditFilter::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.data["from"], "QUEUED");
        assert_eq!(events[0].event.data["to"], "INITIALIZED");
        assert_eq!(events[0].event.data["txHash"], "0xaa");
    }

    #[test]
    fn error_events_carry_a_code() {
        let db = Arc::new(MemoryDb::new());
        let audit = AuditLogger::new(db.clone());
        audit.operational_error(Some("Base"), None, "VAA_NOT_FOUND", "gone");

        let events = db.get_events(&AuditFilter::default()).unwrap();
        assert_eq!(events[0].event.error_code.as_deref(), Some("VAA_NOT_FOUND"));
    }
}
