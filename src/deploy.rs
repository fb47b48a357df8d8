use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::tron::types::CreateContractArgs;

/// Tag selecting the create-contract request shape in external JSON.
pub const CREATE_CONTRACT_METHOD: &str = "tron_createSmartContract";

/// Fee-sharing percentage the caller contract charges its users.
pub const CONSUME_USER_RESOURCE_PERCENT: u8 = 100;

/// Default energy budget the deployer account underwrites.
pub const DEFAULT_ORIGIN_ENERGY_LIMIT: u64 = 10_000_000;

/// A transaction request as submitted to the signer: either an ordinary
/// EVM-shaped request or a native create-contract request.
#[derive(Debug, Clone)]
pub enum TransactionRequest {
    Ethereum(crate::eth::types::EthTransactionRequest),
    CreateContract(CreateContractRequest),
}

impl TransactionRequest {
    /// Parse externally supplied JSON. The `method` field tags the shape;
    /// requests without one are ordinary EVM requests. The transient
    /// `method` and inline `data` fields are stripped before the create
    /// variant is built. Unknown tags fail without any I/O.
    pub fn from_value(mut value: serde_json::Value) -> Result<Self> {
        let method = value
            .get("method")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        match method.as_deref() {
            None => Ok(Self::Ethereum(serde_json::from_value(value)?)),
            Some(CREATE_CONTRACT_METHOD) => {
                if let Some(map) = value.as_object_mut() {
                    map.remove("method");
                    map.remove("data");
                }
                Ok(Self::CreateContract(serde_json::from_value(value)?))
            }
            Some(other) => Err(BridgeError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// A provider-agnostic create-contract request, consumed by the signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    /// Contract ABI as its JSON text.
    pub abi: String,
    /// Runtime bytecode, hex without `0x`.
    pub bytecode: String,
    /// ABI-encoded constructor parameters, hex without `0x`.
    #[serde(default)]
    pub raw_parameter: String,
    /// Maximum fee the deployer authorizes; zero until the signer computes it.
    #[serde(default)]
    pub fee_limit: u64,
    /// Value transferred to the contract at creation, in sun.
    #[serde(default)]
    pub call_value: u64,
    #[serde(default = "default_resource_percent")]
    pub consume_user_resource_percent: u8,
    #[serde(default = "default_origin_energy_limit")]
    pub origin_energy_limit: u64,
    /// Human-readable contract name.
    pub name: String,
}

fn default_resource_percent() -> u8 {
    CONSUME_USER_RESOURCE_PERCENT
}

fn default_origin_energy_limit() -> u64 {
    DEFAULT_ORIGIN_ENERGY_LIMIT
}

impl CreateContractRequest {
    /// Convert into native builder arguments for the given owner.
    pub fn into_args(self, owner_address: String) -> CreateContractArgs {
        CreateContractArgs {
            owner_address,
            abi: self.abi,
            bytecode: self.bytecode,
            parameter: self.raw_parameter,
            name: self.name,
            fee_limit: self.fee_limit,
            call_value: self.call_value,
            consume_user_resource_percent: self.consume_user_resource_percent,
            origin_energy_limit: self.origin_energy_limit,
        }
    }
}

/// Build a create-contract request from ABI, bytecode, and constructor
/// arguments. Produces the request only; the signer executes it.
pub fn build_deploy_request(
    abi: &serde_json::Value,
    bytecode: &str,
    constructor_args: &[DynSolValue],
    value: U256,
    name: &str,
) -> Result<CreateContractRequest> {
    let raw_parameter = encode_constructor_args(constructor_args);
    debug!(
        "Built deploy request: name={}, bytecode_len={}, params_len={}",
        name,
        bytecode.len(),
        raw_parameter.len()
    );

    let call_value = u64::try_from(value)
        .map_err(|_| BridgeError::UnsupportedOperation("call value exceeds native range".to_string()))?;

    Ok(CreateContractRequest {
        abi: serde_json::to_string(abi)?,
        bytecode: strip_hex_prefix(bytecode).to_string(),
        raw_parameter,
        fee_limit: 0,
        call_value,
        consume_user_resource_percent: CONSUME_USER_RESOURCE_PERCENT,
        origin_energy_limit: DEFAULT_ORIGIN_ENERGY_LIMIT,
        name: name.to_string(),
    })
}

/// ABI-encode constructor arguments as unprefixed hex.
pub fn encode_constructor_args(args: &[DynSolValue]) -> String {
    if args.is_empty() {
        return String::new();
    }
    let encoded = DynSolValue::Tuple(args.to_vec()).abi_encode_params();
    hex::encode(encoded)
}

fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;

    #[test]
    fn test_encode_constructor_args() {
        let args = vec![
            DynSolValue::Address(Address::repeat_byte(0x11)),
            DynSolValue::Uint(U256::from(42u64), 256),
        ];
        let encoded = encode_constructor_args(&args);
        // Two 32-byte words: padded address, then the integer.
        assert_eq!(encoded.len(), 128);
        assert!(encoded.starts_with(&format!("{:0>24}{}", "", "11".repeat(20))));
        assert!(encoded.ends_with("2a"));
        assert!(encode_constructor_args(&[]).is_empty());
    }

    #[test]
    fn test_build_deploy_request_defaults() {
        let abi = serde_json::json!([{ "type": "constructor", "inputs": [] }]);
        let request =
            build_deploy_request(&abi, "0x6080604052", &[], U256::ZERO, "Counter").unwrap();
        assert_eq!(request.fee_limit, 0);
        assert_eq!(request.call_value, 0);
        assert_eq!(request.consume_user_resource_percent, 100);
        assert_eq!(request.origin_energy_limit, DEFAULT_ORIGIN_ENERGY_LIMIT);
        assert_eq!(request.bytecode, "6080604052");
        assert!(request.raw_parameter.is_empty());
        assert_eq!(request.name, "Counter");
    }

    #[test]
    fn test_request_tagging() {
        let plain = TransactionRequest::from_value(serde_json::json!({
            "to": format!("0x{}", "22".repeat(20)),
            "value": "0x1",
        }))
        .unwrap();
        assert!(matches!(plain, TransactionRequest::Ethereum(_)));

        let create = TransactionRequest::from_value(serde_json::json!({
            "method": CREATE_CONTRACT_METHOD,
            "data": "0xdeadbeef",
            "abi": "[]",
            "bytecode": "6080",
            "name": "Counter",
        }))
        .unwrap();
        match create {
            TransactionRequest::CreateContract(request) => {
                assert_eq!(request.bytecode, "6080");
                assert_eq!(request.fee_limit, 0);
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        let err = TransactionRequest::from_value(serde_json::json!({
            "method": "tron_freezeBalance",
        }))
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedOperation(_)));
    }
}
