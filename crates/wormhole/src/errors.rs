use thiserror::Error;

/// Wire decoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaaParseError {
    #[error("truncated VAA: wanted {wanted} bytes at offset {at}")]
    Truncated { wanted: usize, at: usize },

    #[error("unsupported VAA version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown token bridge payload id {0}")]
    UnknownPayloadId(u8),
}

/// Classification of a fetch-and-verify failure. Every failed pipeline run
/// produces exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaaFailure {
    L2ReceiptMissing,
    L2TxReverted,
    NoWormholeMessages,
    NoMatchingEmitter,
    VaaNotFound,
    VaaEmitterMismatch,
    VaaProtocolMismatch,
    VaaPayloadMismatch,
    VaaTransferNotCompleted,
    L1CompletionCheckError,
    VaaBytesMissing,
}

impl VaaFailure {
    pub fn code(&self) -> &'static str {
        match self {
            Self::L2ReceiptMissing => "L2_RECEIPT_MISSING",
            Self::L2TxReverted => "L2_TX_REVERTED",
            Self::NoWormholeMessages => "NO_WORMHOLE_MESSAGES",
            Self::NoMatchingEmitter => "NO_MATCHING_EMITTER",
            Self::VaaNotFound => "VAA_NOT_FOUND",
            Self::VaaEmitterMismatch => "VAA_EMITTER_MISMATCH",
            Self::VaaProtocolMismatch => "VAA_PROTOCOL_MISMATCH",
            Self::VaaPayloadMismatch => "VAA_PAYLOAD_MISMATCH",
            Self::VaaTransferNotCompleted => "VAA_TRANSFER_NOT_COMPLETED",
            Self::L1CompletionCheckError => "L1_COMPLETION_CHECK_ERROR",
            Self::VaaBytesMissing => "VAA_BYTES_MISSING",
        }
    }
}

/// A classified failure with its human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", .failure.code())]
pub struct VaaFailureReport {
    pub failure: VaaFailure,
    pub message: String,
}

impl VaaFailureReport {
    pub fn new(failure: VaaFailure, message: impl Into<String>) -> Self {
        Self {
            failure,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_screaming_snake() {
        assert_eq!(VaaFailure::L2ReceiptMissing.code(), "L2_RECEIPT_MISSING");
        assert_eq!(
            VaaFailure::VaaTransferNotCompleted.code(),
            "VAA_TRANSFER_NOT_COMPLETED"
        );
    }

    #[test]
    fn report_renders_code_and_message() {
        let report = VaaFailureReport::new(VaaFailure::VaaNotFound, "nothing came back");
        assert_eq!(report.to_string(), "VAA_NOT_FOUND: nothing came back");
    }
}
