//! Trait definitions for the record stores the engine consumes. Backends
//! provide atomic single-record operations; no multi-record transactional
//! semantics are required (or assumed) anywhere in the engine.

use crate::errors::DbResult;
use crate::types::{
    AuditEvent, AuditFilter, DepositEntry, DepositStatus, NewAuditEvent, RedemptionEntry,
    RedemptionStatus,
};

/// Store for deposit records, keyed by the deterministic deposit id.
pub trait DepositStore: Send + Sync {
    /// Inserts a new record. Inserting an id that already exists is a
    /// non-fatal no-op; backends log a warning and keep the stored record.
    fn create_deposit(&self, entry: &DepositEntry) -> DbResult<()>;

    /// Whole-record replace. Errors with `DbError::NotFound` if the id has
    /// never been created (or was cleaned up).
    fn update_deposit(&self, entry: &DepositEntry) -> DbResult<()>;

    fn get_deposit(&self, id: &str) -> DbResult<Option<DepositEntry>>;

    /// Filtered scan by status, optionally narrowed to one chain. Result
    /// ordering is unspecified; callers must not rely on it.
    fn get_deposits_by_status(
        &self,
        status: DepositStatus,
        chain_name: Option<&str>,
    ) -> DbResult<Vec<DepositEntry>>;

    /// Deletes by id. Deleting an absent id is a no-op.
    fn delete_deposit(&self, id: &str) -> DbResult<()>;
}

/// Store for redemption records. Same contract shape as [`DepositStore`].
pub trait RedemptionStore: Send + Sync {
    fn create_redemption(&self, entry: &RedemptionEntry) -> DbResult<()>;

    fn update_redemption(&self, entry: &RedemptionEntry) -> DbResult<()>;

    fn get_redemption(&self, id: &str) -> DbResult<Option<RedemptionEntry>>;

    fn get_redemptions_by_status(
        &self,
        status: RedemptionStatus,
        chain_name: Option<&str>,
    ) -> DbResult<Vec<RedemptionEntry>>;

    fn delete_redemption(&self, id: &str) -> DbResult<()>;
}

/// Append-only journal of lifecycle transitions and API activity.
pub trait AuditLogStore: Send + Sync {
    /// Appends an event, returning the assigned sequence number.
    fn append_event(&self, event: NewAuditEvent) -> DbResult<u64>;

    /// Reads events matching the filter, in append order.
    fn get_events(&self, filter: &AuditFilter) -> DbResult<Vec<AuditEvent>>;
}
