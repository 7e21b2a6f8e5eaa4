use anyhow::{anyhow, Result};
use bech32::{Bech32, Hrp};

/// Human-readable prefix for Verde account addresses.
const VERDE_HRP: &str = "verde";

pub fn encode_address(bytes: &[u8; 32]) -> Result<String> {
    let hrp = Hrp::parse(VERDE_HRP)?;

    bech32::encode::<Bech32>(hrp, bytes).map_err(|e| anyhow!("Address encoding failed: {}", e))
}

pub fn decode_address(address: &str) -> Result<[u8; 32]> {
    let (hrp, data) =
        bech32::decode(address).map_err(|e| anyhow!("Address decoding failed: {}", e))?;

    if hrp.as_str() != VERDE_HRP {
        return Err(anyhow!(
            "Wrong address prefix '{}' (expected '{}')",
            hrp.as_str(),
            VERDE_HRP
        ));
    }

    to_fixed_bytes(&data)
}

pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// Hex form, with or without a `0x` prefix. Kept for tooling that predates
/// the bech32 format.
pub fn is_hex_address(address: &str) -> bool {
    from_hex_address(address).is_ok()
}

pub fn from_hex_address(hex_addr: &str) -> Result<[u8; 32]> {
    let hex_str = hex_addr.strip_prefix("0x").unwrap_or(hex_addr);
    let bytes = hex::decode(hex_str).map_err(|e| anyhow!("Invalid hex address: {}", e))?;
    to_fixed_bytes(&bytes)
}

fn to_fixed_bytes(data: &[u8]) -> Result<[u8; 32]> {
    if data.len() != 32 {
        return Err(anyhow!(
            "Invalid address length: expected 32 bytes, got {}",
            data.len()
        ));
    }

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(data);
    Ok(bytes)
}
