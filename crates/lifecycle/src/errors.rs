use serde::Serialize;
use tbtc_relayer_chains::ChainError;
use tbtc_relayer_db::DbError;
use thiserror::Error;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A single offending field in a rejected ingress payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors the engine surfaces to callers. Everything else is recovered
/// locally, recorded on the entry, and retried by the next sweep.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("unknown chain {0}")]
    UnknownChain(String),

    #[error("handler: {0}")]
    Handler(#[from] ChainError),

    #[error("db: {0}")]
    Db(#[from] DbError),
}
