use alloy_primitives::{Address, B256, U256};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use rlp::{Rlp, RlpStream};
use sha3::{Digest, Keccak256};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::tron::address::address_from_public_key;

/// A signed EVM transaction, decoded from its raw RLP form.
#[derive(Debug, Clone)]
pub struct DecodedTransaction {
    /// EIP-2718 type byte; `None` for legacy transactions.
    pub tx_type: Option<u8>,
    pub nonce: u64,
    pub gas_price: u64,
    /// EIP-1559 priority fee; legacy transactions carry `None`.
    pub max_priority_fee: Option<u64>,
    pub gas_limit: u64,
    /// Recipient; `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: Option<u64>,
    pub v: u64,
    pub r: Vec<u8>,
    pub s: Vec<u8>,
    /// Raw RLP of the access list, kept verbatim for sighash reconstruction.
    pub access_list_raw: Option<Vec<u8>>,
    /// Keccak-256 of the raw bytes.
    pub hash: B256,
}

/// Decode a raw signed transaction. Supports legacy, EIP-155, and EIP-1559
/// envelopes.
pub fn decode_raw_transaction(raw_tx: &[u8]) -> Result<DecodedTransaction> {
    if raw_tx.is_empty() {
        return Err(BridgeError::Rpc("empty raw transaction".to_string()));
    }

    if raw_tx[0] < 0x7f {
        let tx_type = raw_tx[0];
        debug!("Typed transaction detected: type={}", tx_type);
        if tx_type != 0x02 {
            return Err(BridgeError::Rpc(format!(
                "unsupported transaction type: {}",
                tx_type
            )));
        }
        return decode_eip1559(&raw_tx[1..], raw_tx);
    }

    let rlp = Rlp::new(raw_tx);
    if !rlp.is_list() {
        return Err(BridgeError::Rpc("transaction RLP is not a list".to_string()));
    }
    let items = rlp
        .item_count()
        .map_err(|e| BridgeError::Rpc(format!("RLP parse error: {}", e)))?;
    if items != 9 {
        return Err(BridgeError::Rpc(format!(
            "unexpected RLP item count: {} (expected 9)",
            items
        )));
    }
    decode_legacy(&rlp, raw_tx)
}

fn decode_legacy(rlp: &Rlp, raw_tx: &[u8]) -> Result<DecodedTransaction> {
    // Legacy / EIP-155: [nonce, gasPrice, gasLimit, to, value, data, v, r, s]
    let nonce: u64 = val_at(rlp, 0)?;
    let gas_price: u64 = val_at(rlp, 1)?;
    let gas_limit: u64 = val_at(rlp, 2)?;
    let to = address_at(rlp, 3)?;
    let value = u256_at(rlp, 4)?;
    let data: Vec<u8> = val_at(rlp, 5)?;
    let v: u64 = val_at(rlp, 6)?;
    let r: Vec<u8> = val_at(rlp, 7)?;
    let s: Vec<u8> = val_at(rlp, 8)?;

    let chain_id = if v >= 35 { Some((v - 35) / 2) } else { None };

    Ok(DecodedTransaction {
        tx_type: None,
        nonce,
        gas_price,
        max_priority_fee: None,
        gas_limit,
        to,
        value,
        data,
        chain_id,
        v,
        r,
        s,
        access_list_raw: None,
        hash: keccak(raw_tx),
    })
}

fn decode_eip1559(payload: &[u8], raw_tx: &[u8]) -> Result<DecodedTransaction> {
    // [chainId, nonce, maxPriorityFee, maxFee, gasLimit, to, value, data,
    //  accessList, v, r, s]
    let rlp = Rlp::new(payload);
    let items = rlp
        .item_count()
        .map_err(|e| BridgeError::Rpc(format!("RLP parse error: {}", e)))?;
    if items != 12 {
        return Err(BridgeError::Rpc(format!(
            "unexpected EIP-1559 item count: {} (expected 12)",
            items
        )));
    }

    let chain_id: u64 = val_at(&rlp, 0)?;
    let nonce: u64 = val_at(&rlp, 1)?;
    let max_priority_fee: u64 = val_at(&rlp, 2)?;
    let max_fee: u64 = val_at(&rlp, 3)?;
    let gas_limit: u64 = val_at(&rlp, 4)?;
    let to = address_at(&rlp, 5)?;
    let value = u256_at(&rlp, 6)?;
    let data: Vec<u8> = val_at(&rlp, 7)?;
    let access_list_raw = rlp
        .at(8)
        .map_err(|e| BridgeError::Rpc(format!("RLP access list: {}", e)))?
        .as_raw()
        .to_vec();
    let v: u64 = val_at(&rlp, 9)?;
    let r: Vec<u8> = val_at(&rlp, 10)?;
    let s: Vec<u8> = val_at(&rlp, 11)?;

    Ok(DecodedTransaction {
        tx_type: Some(0x02),
        nonce,
        gas_price: max_fee,
        max_priority_fee: Some(max_priority_fee),
        gas_limit,
        to,
        value,
        data,
        chain_id: Some(chain_id),
        v,
        r,
        s,
        access_list_raw: Some(access_list_raw),
        hash: keccak(raw_tx),
    })
}

impl DecodedTransaction {
    /// Recover the sender address from the signature.
    pub fn recover_sender(&self) -> Result<Address> {
        if self.r.is_empty() || self.s.is_empty() {
            return Err(BridgeError::Rpc("transaction is unsigned".to_string()));
        }

        let recovery_id = self.recovery_id()?;
        let signature = Signature::from_scalars(pad32(&self.r)?, pad32(&self.s)?)
            .map_err(|e| BridgeError::Rpc(format!("signature scalars: {}", e)))?;

        let sighash = self.signing_hash();
        let key = VerifyingKey::recover_from_prehash(sighash.as_slice(), &signature, recovery_id)
            .map_err(|e| BridgeError::Rpc(format!("sender recovery: {}", e)))?;
        Ok(address_from_public_key(&key))
    }

    fn recovery_id(&self) -> Result<RecoveryId> {
        let raw = match self.tx_type {
            Some(_) => self.v,
            None if self.v >= 35 => (self.v - 35) % 2,
            None if self.v == 27 || self.v == 28 => self.v - 27,
            None => {
                return Err(BridgeError::Rpc(format!("invalid signature v: {}", self.v)));
            }
        };
        RecoveryId::try_from(raw as u8)
            .map_err(|e| BridgeError::Rpc(format!("invalid recovery id: {}", e)))
    }

    /// The digest the sender signed, reconstructed from the decoded fields.
    fn signing_hash(&self) -> B256 {
        match self.tx_type {
            Some(tx_type) => {
                let mut stream = RlpStream::new();
                stream.begin_list(9);
                stream.append(&self.chain_id.unwrap_or_default());
                stream.append(&self.nonce);
                stream.append(&self.max_priority_fee.unwrap_or_default());
                stream.append(&self.gas_price);
                stream.append(&self.gas_limit);
                append_address(&mut stream, self.to);
                stream.append(&self.value.to_be_bytes_trimmed_vec());
                stream.append(&self.data);
                match &self.access_list_raw {
                    Some(raw) => {
                        stream.append_raw(raw, 1);
                    }
                    None => {
                        stream.begin_list(0);
                    }
                }
                let mut payload = vec![tx_type];
                payload.extend_from_slice(&stream.out());
                keccak(&payload)
            }
            None => {
                let eip155 = self.chain_id.is_some();
                let mut stream = RlpStream::new();
                stream.begin_list(if eip155 { 9 } else { 6 });
                stream.append(&self.nonce);
                stream.append(&self.gas_price);
                stream.append(&self.gas_limit);
                append_address(&mut stream, self.to);
                stream.append(&self.value.to_be_bytes_trimmed_vec());
                stream.append(&self.data);
                if let Some(chain_id) = self.chain_id {
                    stream.append(&chain_id);
                    stream.append(&0u8);
                    stream.append(&0u8);
                }
                keccak(&stream.out())
            }
        }
    }
}

fn val_at<T: rlp::Decodable>(rlp: &Rlp, index: usize) -> Result<T> {
    rlp.val_at(index)
        .map_err(|e| BridgeError::Rpc(format!("RLP field {}: {}", index, e)))
}

fn address_at(rlp: &Rlp, index: usize) -> Result<Option<Address>> {
    let bytes: Vec<u8> = val_at(rlp, index)?;
    match bytes.len() {
        0 => Ok(None),
        20 => Ok(Some(Address::from_slice(&bytes))),
        n => Err(BridgeError::Rpc(format!("address field is {} bytes", n))),
    }
}

fn u256_at(rlp: &Rlp, index: usize) -> Result<U256> {
    let bytes: Vec<u8> = val_at(rlp, index)?;
    if bytes.len() > 32 {
        return Err(BridgeError::Rpc(format!(
            "value field is {} bytes",
            bytes.len()
        )));
    }
    Ok(U256::from_be_slice(&bytes))
}

fn append_address(stream: &mut RlpStream, address: Option<Address>) {
    match address {
        Some(address) => {
            stream.append(&address.as_slice().to_vec());
        }
        None => {
            stream.append_empty_data();
        }
    }
}

fn keccak(bytes: &[u8]) -> B256 {
    B256::from_slice(&Keccak256::digest(bytes))
}

fn pad32(bytes: &[u8]) -> Result<k256::FieldBytes> {
    if bytes.len() > 32 {
        return Err(BridgeError::Rpc(format!(
            "signature scalar is {} bytes",
            bytes.len()
        )));
    }
    let mut padded = [0u8; 32];
    padded[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(padded.into())
}
