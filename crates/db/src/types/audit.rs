//! Append-only audit journal types.

use serde::{Deserialize, Serialize};

/// Kinds of lifecycle and API activity recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    DepositCreated,
    StatusChange,
    DepositInitialized,
    DepositFinalized,
    DepositAwaitingWormholeVaa,
    DepositBridged,
    DepositDeleted,
    ApiRequest,
    Error,
}

/// An audit event prior to being assigned its journal sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAuditEvent {
    pub timestamp: u64,
    pub event_type: AuditEventType,
    pub deposit_id: Option<String>,
    pub chain_name: Option<String>,
    pub data: serde_json::Value,
    pub error_code: Option<String>,
}

/// A journaled audit event. `id` is the append sequence assigned by the
/// store; consumers must not treat it as gap-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: u64,
    #[serde(flatten)]
    pub event: NewAuditEvent,
}

/// Optional filters for audit journal reads. Empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFilter {
    pub chain_name: Option<String>,
    pub deposit_id: Option<String>,
    pub event_type: Option<AuditEventType>,
}

impl AuditFilter {
    pub fn matches(&self, event: &NewAuditEvent) -> bool {
        if let Some(chain) = &self.chain_name {
            if event.chain_name.as_deref() != Some(chain.as_str()) {
                return false;
            }
        }
        if let Some(id) = &self.deposit_id {
            if event.deposit_id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(ty) = &self.event_type {
            if event.event_type != *ty {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(chain: &str, deposit: &str, ty: AuditEventType) -> NewAuditEvent {
        NewAuditEvent {
            timestamp: 1,
            event_type: ty,
            deposit_id: Some(deposit.into()),
            chain_name: Some(chain.into()),
            data: json!({}),
            error_code: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = AuditFilter::default();
        assert!(f.matches(&event("A", "1", AuditEventType::DepositCreated)));
    }

    #[test]
    fn filters_compose() {
        let f = AuditFilter {
            chain_name: Some("A".into()),
            event_type: Some(AuditEventType::DepositDeleted),
            ..Default::default()
        };
        assert!(f.matches(&event("A", "1", AuditEventType::DepositDeleted)));
        assert!(!f.matches(&event("B", "1", AuditEventType::DepositDeleted)));
        assert!(!f.matches(&event("A", "1", AuditEventType::DepositCreated)));
    }

    #[test]
    fn event_type_wire_names() {
        let json = serde_json::to_string(&AuditEventType::DepositAwaitingWormholeVaa).unwrap();
        assert_eq!(json, "\"DEPOSIT_AWAITING_WORMHOLE_VAA\"");
    }
}
