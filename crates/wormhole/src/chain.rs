//! Wormhole chain identifiers.

use std::fmt::Display;

/// Chains the relayer knows by name. The wire carries bare `u16` ids; this
/// enum covers the ones we route to, `from_id` keeps unknown ids intact for
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum WormholeChain {
    Solana = 1,
    Ethereum = 2,
    Polygon = 5,
    Sui = 21,
    Arbitrum = 23,
    Optimism = 24,
    Base = 30,
}

impl WormholeChain {
    pub fn id(&self) -> u16 {
        *self as u16
    }

    pub fn from_id(id: u16) -> Option<Self> {
        match id {
            1 => Some(Self::Solana),
            2 => Some(Self::Ethereum),
            5 => Some(Self::Polygon),
            21 => Some(Self::Sui),
            23 => Some(Self::Arbitrum),
            24 => Some(Self::Optimism),
            30 => Some(Self::Base),
            _ => None,
        }
    }
}

impl Display for WormholeChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Solana => "Solana",
            Self::Ethereum => "Ethereum",
            Self::Polygon => "Polygon",
            Self::Sui => "Sui",
            Self::Arbitrum => "Arbitrum",
            Self::Optimism => "Optimism",
            Self::Base => "Base",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip() {
        for chain in [
            WormholeChain::Solana,
            WormholeChain::Ethereum,
            WormholeChain::Sui,
            WormholeChain::Base,
        ] {
            assert_eq!(WormholeChain::from_id(chain.id()), Some(chain));
        }
    }

    #[test]
    fn unknown_ids_are_none() {
        assert_eq!(WormholeChain::from_id(9999), None);
    }

    #[test]
    fn ethereum_is_the_default_l1() {
        assert_eq!(WormholeChain::Ethereum.id(), 2);
    }
}
