//! Key/value entries as the Consul KV API represents them

use serde::{Deserialize, Serialize};

/// A single key in the Consul KV tree.
///
/// The JSON shape matches the store's own `KVPair` encoding so archives are
/// interchangeable with ones written by other tooling: indices and flags are
/// omitted when zero and the value is standard base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    #[serde(rename = "Key")]
    pub key: String,

    #[serde(rename = "CreateIndex", default, skip_serializing_if = "is_zero")]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex", default, skip_serializing_if = "is_zero")]
    pub modify_index: u64,

    #[serde(rename = "LockIndex", default, skip_serializing_if = "is_zero")]
    pub lock_index: u64,

    #[serde(rename = "Flags", default, skip_serializing_if = "is_zero")]
    pub flags: u64,

    #[serde(rename = "Value", default, with = "base64_value")]
    pub value: Vec<u8>,

    #[serde(rename = "Session", default, skip_serializing_if = "String::is_empty")]
    pub session: String,
}

impl KvEntry {
    /// Creates an entry with only a key and value set.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            create_index: 0,
            modify_index: 0,
            lock_index: 0,
            flags: 0,
            value: value.into(),
            session: String::new(),
        }
    }

    /// Sets the opaque flags word.
    pub fn with_flags(mut self, flags: u64) -> Self {
        self.flags = flags;
        self
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Base64 (de)serialization for KV values. A JSON `null` reads as empty.
mod base64_value {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(Vec::new()),
            Some(encoded) => BASE64
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
        }
    }
}
