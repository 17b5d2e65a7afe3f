//! Sled-backed implementation of the record store contracts.
//!
//! One tree per table: deposits and redemptions keyed by record id,
//! the audit journal keyed by a big-endian append sequence. Values are the
//! whole record as JSON so the persisted shape round-trips exactly.

use std::path::Path;

use tbtc_relayer_db::errors::{DbError, DbResult};
use tbtc_relayer_db::traits::{AuditLogStore, DepositStore, RedemptionStore};
use tbtc_relayer_db::types::{
    AuditEvent, AuditFilter, DepositEntry, DepositStatus, NewAuditEvent, RedemptionEntry,
    RedemptionStatus,
};
use tracing::warn;

const DEPOSITS_TREE: &str = "deposits";
const REDEMPTIONS_TREE: &str = "redemptions";
const AUDIT_TREE: &str = "audit_log";

/// All three store contracts over a single sled database.
pub struct SledDb {
    db: sled::Db,
    deposits: sled::Tree,
    redemptions: sled::Tree,
    audit: sled::Tree,
}

impl SledDb {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let db = sled::open(path).map_err(backend)?;
        Self::from_db(db)
    }

    /// Wraps an already-open sled handle.
    pub fn from_db(db: sled::Db) -> DbResult<Self> {
        Ok(Self {
            deposits: db.open_tree(DEPOSITS_TREE).map_err(backend)?,
            redemptions: db.open_tree(REDEMPTIONS_TREE).map_err(backend)?,
            audit: db.open_tree(AUDIT_TREE).map_err(backend)?,
            db,
        })
    }

    /// Flushes all trees to disk. Called on shutdown.
    pub fn flush(&self) -> DbResult<()> {
        self.deposits.flush().map_err(backend)?;
        self.redemptions.flush().map_err(backend)?;
        self.audit.flush().map_err(backend)?;
        Ok(())
    }
}

fn backend(e: sled::Error) -> DbError {
    DbError::Backend(e.to_string())
}

fn encode<T: serde::Serialize>(value: &T) -> DbResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> DbResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

impl DepositStore for SledDb {
    fn create_deposit(&self, entry: &DepositEntry) -> DbResult<()> {
        let value = encode(entry)?;
        let prev = self
            .deposits
            .compare_and_swap(entry.id.as_bytes(), None::<&[u8]>, Some(value))
            .map_err(backend)?;
        if prev.is_err() {
            warn!(deposit_id = %entry.id, "deposit already exists, keeping stored record");
        }
        Ok(())
    }

    fn update_deposit(&self, entry: &DepositEntry) -> DbResult<()> {
        if self
            .deposits
            .get(entry.id.as_bytes())
            .map_err(backend)?
            .is_none()
        {
            return Err(DbError::NotFound(entry.id.clone()));
        }
        self.deposits
            .insert(entry.id.as_bytes(), encode(entry)?)
            .map_err(backend)?;
        Ok(())
    }

    fn get_deposit(&self, id: &str) -> DbResult<Option<DepositEntry>> {
        self.deposits
            .get(id.as_bytes())
            .map_err(backend)?
            .map(|v| decode(&v))
            .transpose()
    }

    fn get_deposits_by_status(
        &self,
        status: DepositStatus,
        chain_name: Option<&str>,
    ) -> DbResult<Vec<DepositEntry>> {
        let mut out = Vec::new();
        for item in self.deposits.iter() {
            let (_, value) = item.map_err(backend)?;
            let entry: DepositEntry = decode(&value)?;
            if entry.status == status && chain_name.map_or(true, |c| entry.chain_name == c) {
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn delete_deposit(&self, id: &str) -> DbResult<()> {
        self.deposits.remove(id.as_bytes()).map_err(backend)?;
        Ok(())
    }
}

impl RedemptionStore for SledDb {
    fn create_redemption(&self, entry: &RedemptionEntry) -> DbResult<()> {
        let value = encode(entry)?;
        let prev = self
            .redemptions
            .compare_and_swap(entry.id.as_bytes(), None::<&[u8]>, Some(value))
            .map_err(backend)?;
        if prev.is_err() {
            warn!(redemption_id = %entry.id, "redemption already exists, keeping stored record");
        }
        Ok(())
    }

    fn update_redemption(&self, entry: &RedemptionEntry) -> DbResult<()> {
        if self
            .redemptions
            .get(entry.id.as_bytes())
            .map_err(backend)?
            .is_none()
        {
            return Err(DbError::NotFound(entry.id.clone()));
        }
        self.redemptions
            .insert(entry.id.as_bytes(), encode(entry)?)
            .map_err(backend)?;
        Ok(())
    }

    fn get_redemption(&self, id: &str) -> DbResult<Option<RedemptionEntry>> {
        self.redemptions
            .get(id.as_bytes())
            .map_err(backend)?
            .map(|v| decode(&v))
            .transpose()
    }

    fn get_redemptions_by_status(
        &self,
        status: RedemptionStatus,
        chain_name: Option<&str>,
    ) -> DbResult<Vec<RedemptionEntry>> {
        let mut out = Vec::new();
        for item in self.redemptions.iter() {
            let (_, value) = item.map_err(backend)?;
            let entry: RedemptionEntry = decode(&value)?;
            if entry.status == status && chain_name.map_or(true, |c| entry.chain_name == c) {
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn delete_redemption(&self, id: &str) -> DbResult<()> {
        self.redemptions.remove(id.as_bytes()).map_err(backend)?;
        Ok(())
    }
}

impl AuditLogStore for SledDb {
    fn append_event(&self, event: NewAuditEvent) -> DbResult<u64> {
        // The sequence is the db's monotonic id so appends from multiple
        // tasks never collide.
        let id = self.db.generate_id().map_err(backend)?;
        let stored = AuditEvent { id, event };
        self.audit
            .insert(id.to_be_bytes(), encode(&stored)?)
            .map_err(backend)?;
        Ok(id)
    }

    fn get_events(&self, filter: &AuditFilter) -> DbResult<Vec<AuditEvent>> {
        let mut out = Vec::new();
        for item in self.audit.iter() {
            let (_, value) = item.map_err(backend)?;
            let event: AuditEvent = decode(&value)?;
            if filter.matches(&event.event) {
                out.push(event);
            }
        }
        Ok(out)
    }
}
