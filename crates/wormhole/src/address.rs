//! Universal (32-byte) emitter address handling.

use std::fmt::Display;
use std::str::FromStr;

use alloy_primitives::Address;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("emitter address {0:?} is not a 20- or 32-byte hex string")]
    Malformed(String),
}

/// The canonical 32-byte form of an emitter address. Native EVM addresses
/// are left-padded with zeros; 32-byte native forms pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniversalAddress(pub [u8; 32]);

impl UniversalAddress {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Converts a native-form address string into universal form.
    pub fn from_native(value: &str) -> Result<Self, AddressError> {
        if let Ok(evm) = value.parse::<Address>() {
            let mut out = [0u8; 32];
            out[12..].copy_from_slice(evm.as_slice());
            return Ok(Self(out));
        }

        let stripped = value.strip_prefix("0x").unwrap_or(value);
        if stripped.len() == 64 {
            if let Ok(bytes) = hex::decode(stripped) {
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                return Ok(Self(out));
            }
        }

        Err(AddressError::Malformed(value.to_string()))
    }
}

impl From<[u8; 32]> for UniversalAddress {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl FromStr for UniversalAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_native(s)
    }
}

impl Display for UniversalAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
