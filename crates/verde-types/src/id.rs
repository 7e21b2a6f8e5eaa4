use crate::address::AccountAddress;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain tags for deterministic entity derivation. Each entity class hashes
/// its tag plus identifying bytes, so locating an entity never needs a stored
/// lookup table.
pub const GOVERNANCE_CONFIG_TAG: &[u8] = b"config";
pub const MINTER_CERT_TAG: &[u8] = b"m";
pub const CONSUMER_CERT_TAG: &[u8] = b"c";
pub const TOKEN_DEFINITION_TAG: &[u8] = b"cct";
pub const FEE_COLLECTOR_TAG: &[u8] = b"fees";

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId([u8; 32]);

impl EntityId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Pure derivation: `tag` plus each identifying part, length-prefixed so
/// distinct part boundaries can never collide.
pub fn derive_id(tag: &[u8], parts: &[&[u8]]) -> EntityId {
    let mut hasher = Hasher::new();
    hasher.update(&(tag.len() as u32).to_le_bytes());
    hasher.update(tag);
    for part in parts {
        hasher.update(&(part.len() as u32).to_le_bytes());
        hasher.update(part);
    }
    EntityId(*hasher.finalize().as_bytes())
}

pub fn governance_config_id() -> EntityId {
    derive_id(GOVERNANCE_CONFIG_TAG, &[])
}

pub fn minter_certificate_id(holder: &AccountAddress) -> EntityId {
    derive_id(MINTER_CERT_TAG, &[holder.as_bytes()])
}

pub fn consumer_certificate_id(holder: &AccountAddress) -> EntityId {
    derive_id(CONSUMER_CERT_TAG, &[holder.as_bytes()])
}

pub fn token_definition_id(symbol: &str) -> EntityId {
    derive_id(TOKEN_DEFINITION_TAG, &[symbol.as_bytes()])
}
