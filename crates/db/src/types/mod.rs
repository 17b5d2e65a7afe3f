//! Persisted record types. These round-trip byte-exact through serde_json;
//! field names stay camelCase on the wire to match the store contract.

mod audit;
mod deposit;
mod redemption;

pub use audit::{AuditEvent, AuditEventType, AuditFilter, NewAuditEvent};
pub use deposit::{
    DepositDateField, DepositDates, DepositEntry, DepositHashes, DepositReceipt, DepositStatus,
    FundingTransaction, L1OutputEvent, Reveal, WormholeInfo,
};
pub use redemption::{
    RedemptionDates, RedemptionEntry, RedemptionRequestedEvent, RedemptionStatus, VaaStatus,
};

/// Serde helper for `Option<Vec<u8>>` rendered as a hex string.
pub(crate) mod hex_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom))
            .transpose()
    }
}
