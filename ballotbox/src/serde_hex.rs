//! Hex (de)serialization for ciphertexts, for use in `#[serde(with)]`.

use serde::{Deserialize, Deserializer, Serializer};

pub use hex::serde as hex_bytes;

/// Hex encoding for an optional byte buffer, `null` when absent
pub mod hex_option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&hex::encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let value: Option<String> = Option::deserialize(d)?;
        value
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
