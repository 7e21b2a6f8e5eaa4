use crate::address_encoding;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte account identity. The protocol never inspects the bytes; they come
/// from whatever key scheme the surrounding ledger substrate uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountAddress([u8; 32]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bech32(&self) -> Result<String> {
        address_encoding::encode_address(&self.0)
    }

    pub fn from_bech32(address: &str) -> Result<Self> {
        let bytes = address_encoding::decode_address(address)?;
        Ok(Self(bytes))
    }

    pub fn from_string(address: &str) -> Result<Self> {
        if address.starts_with("verde") {
            Self::from_bech32(address)
        } else if address_encoding::is_hex_address(address) {
            let bytes = address_encoding::from_hex_address(address)?;
            Ok(Self(bytes))
        } else {
            Err(anyhow::anyhow!("Invalid address format"))
        }
    }

    /// Protocol-controlled account that accumulates withheld transfer fees.
    /// Derived from a fixed domain tag so every deployment agrees on it.
    pub fn fee_collector() -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(crate::id::FEE_COLLECTOR_TAG);
        Self(*hasher.finalize().as_bytes())
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(addr) => write!(f, "{}", addr),
            // Fall back to hex if encoding fails (shouldn't happen in practice)
            Err(_) => write!(f, "0x{}", hex::encode(&self.0[..8])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bech32_round_trip() {
        let addr = AccountAddress::from_bytes([7; 32]);
        let encoded = addr.to_bech32().unwrap();
        assert_eq!(AccountAddress::from_bech32(&encoded).unwrap(), addr);
        assert_eq!(AccountAddress::from_string(&encoded).unwrap(), addr);
    }

    #[test]
    fn test_from_hex_string() {
        let addr = AccountAddress::from_bytes([0xAB; 32]);
        let hex_str = format!("0x{}", hex::encode(addr.as_bytes()));
        assert_eq!(AccountAddress::from_string(&hex_str).unwrap(), addr);
    }

    #[test]
    fn test_fee_collector_is_stable() {
        assert_eq!(AccountAddress::fee_collector(), AccountAddress::fee_collector());
        assert_ne!(
            AccountAddress::fee_collector(),
            AccountAddress::from_bytes([0; 32])
        );
    }
}
