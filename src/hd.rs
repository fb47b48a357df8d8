//! Hierarchical deterministic key derivation for mnemonic-configured
//! accounts: BIP-39 seed, BIP-32 child derivation, BIP-44 style paths.
//! The bridge derives exactly one key per mnemonic descriptor.

use hmac::{Hmac, Mac};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::PrimeField;
use k256::Scalar;
use sha2::Sha512;

use crate::error::{BridgeError, Result};

type HmacSha512 = Hmac<Sha512>;

const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Default derivation path for native-chain accounts (coin type 195).
pub const DEFAULT_DERIVATION_PATH: &str = "m/44'/195'/0'/0";

/// Derive the private key at `path/index` from a BIP-39 mnemonic.
pub fn derive_private_key(
    mnemonic: &str,
    passphrase: &str,
    path: &str,
    index: u32,
) -> Result<SigningKey> {
    let seed = mnemonic_to_seed(mnemonic, passphrase);

    let mut segments = parse_path(path)?;
    segments.push(index);

    let (mut key, mut chain_code) = master_key(&seed)?;
    for segment in segments {
        let (child, child_chain) = derive_child(&key, &chain_code, segment)?;
        key = child;
        chain_code = child_chain;
    }
    Ok(key)
}

/// BIP-39: PBKDF2-HMAC-SHA512 over the mnemonic with a salted passphrase,
/// 2048 rounds, 64-byte seed.
fn mnemonic_to_seed(mnemonic: &str, passphrase: &str) -> [u8; 64] {
    let salt = format!("mnemonic{}", passphrase);
    let mut seed = [0u8; 64];
    pbkdf2::pbkdf2_hmac::<Sha512>(mnemonic.as_bytes(), salt.as_bytes(), 2048, &mut seed);
    seed
}

/// BIP-32 master key from a seed.
fn master_key(seed: &[u8]) -> Result<(SigningKey, [u8; 32])> {
    let mut mac = HmacSha512::new_from_slice(b"Bitcoin seed")
        .map_err(|e| BridgeError::InvalidAccountConfig(format!("hmac: {}", e)))?;
    mac.update(seed);
    let digest = mac.finalize().into_bytes();

    let key = SigningKey::from_slice(&digest[..32])
        .map_err(|e| BridgeError::InvalidAccountConfig(format!("master key: {}", e)))?;
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&digest[32..]);
    Ok((key, chain_code))
}

/// One CKD step: hardened segments commit to the parent private key,
/// normal segments to the compressed public key.
fn derive_child(
    parent: &SigningKey,
    chain_code: &[u8; 32],
    segment: u32,
) -> Result<(SigningKey, [u8; 32])> {
    let mut mac = HmacSha512::new_from_slice(chain_code)
        .map_err(|e| BridgeError::InvalidAccountConfig(format!("hmac: {}", e)))?;

    if segment >= HARDENED_OFFSET {
        mac.update(&[0u8]);
        mac.update(&parent.to_bytes());
    } else {
        let point = parent.verifying_key().to_encoded_point(true);
        mac.update(point.as_bytes());
    }
    mac.update(&segment.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let mut tweak_bytes = [0u8; 32];
    tweak_bytes.copy_from_slice(&digest[..32]);
    let tweak = Option::<Scalar>::from(Scalar::from_repr(tweak_bytes.into()))
        .ok_or_else(|| BridgeError::InvalidAccountConfig("derived tweak out of range".to_string()))?;

    let parent_scalar: Scalar = **parent.as_nonzero_scalar();
    let child_scalar = tweak + parent_scalar;

    let child = SigningKey::from_slice(&child_scalar.to_bytes())
        .map_err(|_| BridgeError::InvalidAccountConfig("derived key is zero".to_string()))?;

    let mut child_chain = [0u8; 32];
    child_chain.copy_from_slice(&digest[32..]);
    Ok((child, child_chain))
}

/// Parse a `m/44'/195'/0'/0` style path into child indices.
fn parse_path(path: &str) -> Result<Vec<u32>> {
    let mut parts = path.split('/');
    match parts.next() {
        Some("m") | Some("M") => {}
        _ => {
            return Err(BridgeError::InvalidAccountConfig(format!(
                "derivation path must start with m/: {}",
                path
            )));
        }
    }

    let mut segments = Vec::new();
    for part in parts {
        if part.is_empty() {
            continue;
        }
        let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
            Some(digits) => (digits, true),
            None => (part, false),
        };
        let index: u32 = digits.parse().map_err(|_| {
            BridgeError::InvalidAccountConfig(format!("bad path segment: {}", part))
        })?;
        if index >= HARDENED_OFFSET {
            return Err(BridgeError::InvalidAccountConfig(format!(
                "path segment out of range: {}",
                part
            )));
        }
        segments.push(if hardened { index + HARDENED_OFFSET } else { index });
    }
    Ok(segments)
}
