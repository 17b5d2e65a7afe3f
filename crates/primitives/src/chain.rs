//! Destination chain classification.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The family a destination chain belongs to. Determines the deposit key
/// derivation variant and which post-finalization path applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    /// EVM chains (L1 and L2 rollups). Deposit keys reverse the funding txid
    /// byte order before hashing.
    Evm,

    /// StarkNet. Same derivation as EVM but without the byte reversal.
    Starknet,

    /// Chains that mint via a Wormhole bridge-back after L1 finalization.
    Solana,

    /// Sui, same bridging path as Solana.
    Sui,
}

impl ChainFamily {
    /// Whether deposits on this family need the Wormhole bridge-back leg
    /// after L1 finalization.
    pub fn requires_bridging(&self) -> bool {
        matches!(self, Self::Solana | Self::Sui)
    }

    /// Whether the funding txid bytes are reversed before hashing into the
    /// deposit key.
    pub fn reverses_funding_txid(&self) -> bool {
        !matches!(self, Self::Starknet)
    }
}

impl Display for ChainFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Evm => write!(f, "evm"),
            Self::Starknet => write!(f, "starknet"),
            Self::Solana => write!(f, "solana"),
            Self::Sui => write!(f, "sui"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridging_families() {
        assert!(!ChainFamily::Evm.requires_bridging());
        assert!(!ChainFamily::Starknet.requires_bridging());
        assert!(ChainFamily::Solana.requires_bridging());
        assert!(ChainFamily::Sui.requires_bridging());
    }

    #[test]
    fn only_starknet_skips_reversal() {
        assert!(ChainFamily::Evm.reverses_funding_txid());
        assert!(ChainFamily::Solana.reverses_funding_txid());
        assert!(!ChainFamily::Starknet.reverses_funding_txid());
    }

    #[test]
    fn serde_roundtrip() {
        let fam: ChainFamily = serde_json::from_str("\"starknet\"").unwrap();
        assert_eq!(fam, ChainFamily::Starknet);
        assert_eq!(serde_json::to_string(&fam).unwrap(), "\"starknet\"");
    }
}
