//! VAA wire codec.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! header:  version u8 | guardian_set_index u32 | num_signatures u8
//!          | num × (guardian_index u8, signature [65])
//! body:    timestamp u32 | nonce u32 | emitter_chain u16
//!          | emitter_address [32] | sequence u64 | consistency_level u8
//!          | payload …
//! ```
//!
//! Token bridge payloads are discriminated by their first byte: 1 is a
//! plain transfer, 3 a transfer with payload.

use alloy_primitives::U256;

use crate::address::UniversalAddress;
use crate::errors::VaaParseError;

pub const SIGNATURE_LEN: usize = 65;

/// Protocol name reported for token bridge payloads.
pub const TOKEN_BRIDGE_PROTOCOL: &str = "TokenBridge";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSignature {
    pub guardian_index: u8,
    pub signature: [u8; SIGNATURE_LEN],
}

/// A parsed VAA. `bytes` keeps the original wire form when the VAA came
/// off the wire; [`Vaa::serialize`] reconstructs it either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<GuardianSignature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: u16,
    pub emitter_address: UniversalAddress,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
    pub bytes: Option<Vec<u8>>,
}

/// Decoded token bridge payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenBridgePayload {
    Transfer {
        amount: U256,
        token_address: UniversalAddress,
        token_chain: u16,
        recipient: UniversalAddress,
        recipient_chain: u16,
        fee: U256,
    },
    TransferWithPayload {
        amount: U256,
        token_address: UniversalAddress,
        token_chain: u16,
        recipient: UniversalAddress,
        recipient_chain: u16,
        sender: UniversalAddress,
        payload: Vec<u8>,
    },
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], VaaParseError> {
        if self.pos + n > self.data.len() {
            return Err(VaaParseError::Truncated {
                wanted: n,
                at: self.pos,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, VaaParseError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, VaaParseError> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().expect("len 2")))
    }

    fn u32(&mut self) -> Result<u32, VaaParseError> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().expect("len 4")))
    }

    fn u64(&mut self) -> Result<u64, VaaParseError> {
        Ok(u64::from_be_bytes(self.take(8)?.try_into().expect("len 8")))
    }

    fn u256(&mut self) -> Result<U256, VaaParseError> {
        Ok(U256::from_be_slice(self.take(32)?))
    }

    fn bytes32(&mut self) -> Result<[u8; 32], VaaParseError> {
        Ok(self.take(32)?.try_into().expect("len 32"))
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.data[self.pos..];
        self.pos = self.data.len();
        out
    }
}

impl Vaa {
    /// Parses the wire form, retaining the original bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self, VaaParseError> {
        let mut r = Reader::new(bytes);

        let version = r.u8()?;
        if version != 1 {
            return Err(VaaParseError::UnsupportedVersion(version));
        }

        let guardian_set_index = r.u32()?;
        let num_signatures = r.u8()?;
        let mut signatures = Vec::with_capacity(num_signatures as usize);
        for _ in 0..num_signatures {
            let guardian_index = r.u8()?;
            let signature: [u8; SIGNATURE_LEN] =
                r.take(SIGNATURE_LEN)?.try_into().expect("len 65");
            signatures.push(GuardianSignature {
                guardian_index,
                signature,
            });
        }

        let timestamp = r.u32()?;
        let nonce = r.u32()?;
        let emitter_chain = r.u16()?;
        let emitter_address = UniversalAddress(r.bytes32()?);
        let sequence = r.u64()?;
        let consistency_level = r.u8()?;
        let payload = r.rest().to_vec();

        Ok(Self {
            version,
            guardian_set_index,
            signatures,
            timestamp,
            nonce,
            emitter_chain,
            emitter_address,
            sequence,
            consistency_level,
            payload,
            bytes: Some(bytes.to_vec()),
        })
    }

    /// Reconstructs the wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            6 + self.signatures.len() * (1 + SIGNATURE_LEN) + 51 + self.payload.len(),
        );
        out.push(self.version);
        out.extend_from_slice(&self.guardian_set_index.to_be_bytes());
        out.push(self.signatures.len() as u8);
        for sig in &self.signatures {
            out.push(sig.guardian_index);
            out.extend_from_slice(&sig.signature);
        }
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out.extend_from_slice(&self.emitter_chain.to_be_bytes());
        out.extend_from_slice(self.emitter_address.as_bytes());
        out.extend_from_slice(&self.sequence.to_be_bytes());
        out.push(self.consistency_level);
        out.extend_from_slice(&self.payload);
        out
    }

    /// Wire bytes: the captured original if present and non-empty,
    /// otherwise a fresh serialization.
    pub fn wire_bytes(&self) -> Vec<u8> {
        match &self.bytes {
            Some(b) if !b.is_empty() => b.clone(),
            _ => self.serialize(),
        }
    }

    /// Protocol this VAA's payload belongs to, judged by its discriminator.
    pub fn protocol_name(&self) -> &'static str {
        match self.payload.first() {
            Some(1) | Some(3) => TOKEN_BRIDGE_PROTOCOL,
            _ => "Unknown",
        }
    }

    /// Payload name within the protocol.
    pub fn payload_name(&self) -> &'static str {
        match self.payload.first() {
            Some(1) => "Transfer",
            Some(3) => "TransferWithPayload",
            _ => "Unknown",
        }
    }

    /// Decodes the token bridge payload, if this is one.
    pub fn token_bridge_payload(&self) -> Result<TokenBridgePayload, VaaParseError> {
        let mut r = Reader::new(&self.payload);
        match r.u8()? {
            1 => Ok(TokenBridgePayload::Transfer {
                amount: r.u256()?,
                token_address: UniversalAddress(r.bytes32()?),
                token_chain: r.u16()?,
                recipient: UniversalAddress(r.bytes32()?),
                recipient_chain: r.u16()?,
                fee: r.u256()?,
            }),
            3 => Ok(TokenBridgePayload::TransferWithPayload {
                amount: r.u256()?,
                token_address: UniversalAddress(r.bytes32()?),
                token_chain: r.u16()?,
                recipient: UniversalAddress(r.bytes32()?),
                recipient_chain: r.u16()?,
                sender: UniversalAddress(r.bytes32()?),
                payload: r.rest().to_vec(),
            }),
            other => Err(VaaParseError::UnknownPayloadId(other)),
        }
    }
}
