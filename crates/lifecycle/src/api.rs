//! The ingress-facing lifecycle API. The HTTP layer is a thin translation
//! onto these methods.

use std::sync::Arc;

use serde::Serialize;
use tbtc_relayer_chains::{ChainRegistry, TxReceipt};
use tbtc_relayer_db::traits::{AuditLogStore, DepositStore};
use tbtc_relayer_db::types::{AuditEvent, AuditFilter, DepositEntry, DepositStatus};
use tbtc_relayer_primitives::derive_deposit_id;
use tracing::{info, warn};

use crate::audit::AuditLogger;
use crate::deposit::{self, TransitionOutcome};
use crate::errors::{FieldError, LifecycleError, LifecycleResult};
use crate::reveal::{validate, RevealRequest};

/// Result of a successful reveal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealOutcome {
    pub deposit_id: String,
    pub receipt: TxReceipt,
}

pub struct LifecycleApi {
    deposits: Arc<dyn DepositStore>,
    audit_store: Arc<dyn AuditLogStore>,
    audit: AuditLogger,
    registry: ChainRegistry,
}

impl LifecycleApi {
    pub fn new(
        deposits: Arc<dyn DepositStore>,
        audit_store: Arc<dyn AuditLogStore>,
        registry: ChainRegistry,
    ) -> Self {
        Self {
            deposits,
            audit: AuditLogger::new(audit_store.clone()),
            audit_store,
            registry,
        }
    }

    /// Creates the deposit record and attempts the immediate L1
    /// initialization. On handler failure the record stays `Queued` for the
    /// scheduler to retry, and the error is surfaced to the caller.
    pub async fn reveal_deposit(
        &self,
        chain_name: &str,
        request: RevealRequest,
    ) -> LifecycleResult<RevealOutcome> {
        let handler = self
            .registry
            .get(chain_name)
            .ok_or_else(|| LifecycleError::UnknownChain(chain_name.to_string()))?;

        let validated = validate(&request).map_err(LifecycleError::Validation)?;

        let deposit_id = derive_deposit_id(
            &validated.funding_tx_hash,
            validated.funding_output_index,
            handler.chain_family(),
        )
        .map_err(|e| {
            LifecycleError::Validation(vec![FieldError::new("fundingTx", e.to_string())])
        })?;

        let entry = DepositEntry::new_queued(
            deposit_id.clone(),
            chain_name.to_string(),
            validated.funding_tx_hash.clone(),
            validated.funding_output_index,
            validated.l1_output_event.l2_deposit_owner.clone(),
            validated.receipt.clone(),
            Some(validated.l1_output_event.clone()),
        );

        self.deposits.create_deposit(&entry)?;
        self.audit.deposit_created(&entry);
        info!(%deposit_id, chain = %chain_name, "deposit revealed");

        // Work from the stored record: on a duplicate reveal the create was
        // a no-op and the record may already be past QUEUED, which the
        // updater's precondition turns into a no-op as well.
        let entry = self.deposits.get_deposit(&deposit_id)?.unwrap_or(entry);

        match handler.initialize_deposit(&entry).await {
            Ok(receipt) if receipt.is_success() => {
                deposit::update_to_initialized(
                    &*self.deposits,
                    &self.audit,
                    &entry,
                    TransitionOutcome::Confirmed {
                        tx_hash: &receipt.transaction_hash,
                    },
                )?;
                Ok(RevealOutcome {
                    deposit_id,
                    receipt,
                })
            }
            Ok(receipt) => {
                let error = format!(
                    "initialization transaction {} reverted",
                    receipt.transaction_hash
                );
                warn!(%deposit_id, %error, "initialization failed");
                deposit::record_deposit_error(&*self.deposits, &entry, &error)?;
                Err(LifecycleError::Handler(
                    tbtc_relayer_chains::ChainError::Refused(error),
                ))
            }
            Err(e) => {
                warn!(%deposit_id, err = %e, "initialization failed, deposit stays queued");
                deposit::record_deposit_error(&*self.deposits, &entry, &e.to_string())?;
                Err(e.into())
            }
        }
    }

    /// Status lookup scoped to one chain. `None` maps to 404 upstream.
    pub fn get_deposit_status(
        &self,
        chain_name: &str,
        deposit_id: &str,
    ) -> LifecycleResult<Option<DepositStatus>> {
        if !self.registry.contains(chain_name) {
            return Err(LifecycleError::UnknownChain(chain_name.to_string()));
        }

        Ok(self
            .deposits
            .get_deposit(deposit_id)?
            .filter(|e| e.chain_name == chain_name)
            .map(|e| e.status))
    }

    /// Audit journal reads for the audit-logs endpoint.
    pub fn get_audit_events(&self, filter: &AuditFilter) -> LifecycleResult<Vec<AuditEvent>> {
        Ok(self.audit_store.get_events(filter)?)
    }

    /// Records API activity in the journal.
    pub fn record_api_request(
        &self,
        chain_name: &str,
        endpoint: &str,
        deposit_id: Option<&str>,
    ) {
        self.audit.api_request(chain_name, endpoint, deposit_id);
    }
}
