use thiserror::Error;

pub type ChainResult<T> = Result<T, ChainError>;

/// Error from a chain handler operation.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transient RPC failure (network blip, timeout, rate limit). The sweep
    /// records it on the entry and retries next tick.
    #[error("rpc: {0}")]
    Rpc(String),

    /// The target contract already processed this operation. Deposit ids are
    /// deterministic, so handlers map duplicate-submission rejections here
    /// and the state machine advances as if the submission succeeded.
    #[error("operation already completed on-chain")]
    AlreadyCompleted,

    /// The handler explicitly refuses the operation (bad deposit data,
    /// unsupported parameters). Surfaced to the caller.
    #[error("refused: {0}")]
    Refused(String),

    /// The handler does not implement this optional capability.
    #[error("operation not supported by this chain")]
    NotSupported,

    #[error("{0}")]
    Other(String),
}

impl ChainError {
    /// Whether the next sweep should retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Other(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(ChainError::Rpc("timeout".into()).is_retryable());
        assert!(ChainError::Other("??".into()).is_retryable());
        assert!(!ChainError::AlreadyCompleted.is_retryable());
        assert!(!ChainError::Refused("bad data".into()).is_retryable());
        assert!(!ChainError::NotSupported.is_retryable());
    }
}
