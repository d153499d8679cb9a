use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The store-assigned 12 byte identifier. It is the join key across source
/// collections and the message key on every output topic, so it must render
/// identically for every event touching the same entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EntityId([u8; 12]);

#[derive(Debug, Error, PartialEq)]
pub enum IdParseError {
    #[error("expected 24 hex characters, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl EntityId {
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// All-zero ids are what the store writes for an unset embedded reference.
    pub fn is_nil(&self) -> bool {
        self.0 == [0; 12]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 {
            return Err(IdParseError::InvalidLength(s.len()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.to_hex())
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

// Change streams render ids as extended JSON, the services we call render them
// as plain hex. Both forms are accepted everywhere.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Hex(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match RawId::deserialize(deserializer)? {
            RawId::Hex(s) => s,
            RawId::Extended { oid } => oid,
        };
        raw.parse().map_err(serde::de::Error::custom)
    }
}
