use alloy_primitives::{Address, B256};
use k256::ecdsa::{SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::error::{BridgeError, Result};

/// Prefix byte of the native hex address form.
pub const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Derive the 20-byte account address from a secp256k1 verifying key.
///
/// Tron and the EVM share the derivation: Keccak-256 over the uncompressed
/// public key (without the 0x04 marker), last 20 bytes.
pub fn address_from_public_key(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Derive the account address from a signing key.
pub fn address_from_key(key: &SigningKey) -> Address {
    address_from_public_key(key.verifying_key())
}

/// Parse a private key from hex (with or without `0x`).
pub fn key_from_hex(private_key: &str) -> Result<SigningKey> {
    let stripped = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(stripped)
        .map_err(|e| BridgeError::InvalidAccountConfig(format!("private key hex: {}", e)))?;
    SigningKey::from_slice(&bytes)
        .map_err(|e| BridgeError::InvalidAccountConfig(format!("private key: {}", e)))
}

/// Encode an address in the native hex form: `41` + 20 bytes, no `0x`.
pub fn to_tron_hex(address: &Address) -> String {
    let mut bytes = Vec::with_capacity(21);
    bytes.push(TRON_ADDRESS_PREFIX);
    bytes.extend_from_slice(address.as_slice());
    hex::encode(bytes)
}

/// Parse a transaction id (with or without `0x`) into a 32-byte hash.
/// The resulting [`B256`] is the canonical form used throughout.
pub fn hash_from_hex(hash: &str) -> Result<B256> {
    let stripped = hash.strip_prefix("0x").unwrap_or(hash);
    let bytes = hex::decode(stripped)
        .map_err(|e| BridgeError::Native(format!("transaction id hex: {}", e)))?;
    if bytes.len() != 32 {
        return Err(BridgeError::Native(format!(
            "transaction id must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_well_known_key() {
        // Private key 0x...01 derives the classic test address.
        let mut raw = [0u8; 32];
        raw[31] = 1;
        let key = SigningKey::from_slice(&raw).unwrap();
        let address = address_from_key(&key);
        let expected =
            Address::from_slice(&hex::decode("7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap());
        assert_eq!(address, expected);
    }

    #[test]
    fn test_tron_hex_encoding() {
        let address = Address::repeat_byte(0xab);
        let native = to_tron_hex(&address);
        assert!(native.starts_with("41"));
        assert_eq!(native.len(), 42);
        assert_eq!(&native[2..], hex::encode(address));
    }

    #[test]
    fn test_hash_from_hex_rejects_bad_length() {
        assert!(hash_from_hex("0x1234").is_err());
        let ok = hash_from_hex(&"ef".repeat(32)).unwrap();
        assert_eq!(ok, B256::repeat_byte(0xef));
    }
}
