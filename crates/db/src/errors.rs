use thiserror::Error;

/// Simple result type used across the store interfaces.
pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record {0} not found")]
    NotFound(String),

    #[error("could not encode record: {0}")]
    Codec(String),

    #[error("backend: {0}")]
    Backend(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for DbError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value.to_string())
    }
}
