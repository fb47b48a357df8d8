use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// JSON-RPC request to the EVM-style endpoint.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: 1,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC response from the EVM-style endpoint.
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// An EVM-shaped transaction request, as callers hand it to the provider.
///
/// All fields are optional; the bridge strips the ones the native chain has
/// no semantics for before delegating.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthTransactionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<String>,
}

impl EthTransactionRequest {
    /// Calldata as raw bytes (empty when absent).
    pub fn data_bytes(&self) -> Result<Vec<u8>> {
        match &self.data {
            None => Ok(Vec::new()),
            Some(data) => {
                let stripped = data.strip_prefix("0x").unwrap_or(data);
                hex::decode(stripped).map_err(|e| BridgeError::Rpc(format!("calldata hex: {}", e)))
            }
        }
    }
}

/// An EVM-shaped transaction receipt as the JSON-RPC endpoint returns it.
/// Quantities stay in their hex-string wire form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default)]
    pub transaction_index: Option<String>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub cumulative_gas_used: Option<String>,
    /// `0x1` success, `0x0` failure.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: serde_json::Value,
}

impl TransactionReceipt {
    /// Whether the receipt reports a successful execution. A receipt without
    /// a status field (pre-Byzantium shape) is treated as successful.
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            None => true,
            Some(status) => parse_quantity(status).map(|v| v != 0).unwrap_or(false),
        }
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(quantity: &str) -> Result<u64> {
    let stripped = quantity.strip_prefix("0x").unwrap_or(quantity);
    u64::from_str_radix(stripped, 16)
        .map_err(|e| BridgeError::Rpc(format!("quantity {}: {}", quantity, e)))
}

/// Parse a `0x`-prefixed hex quantity into a [`U256`].
pub fn parse_quantity_u256(quantity: &str) -> Result<U256> {
    let stripped = quantity.strip_prefix("0x").unwrap_or(quantity);
    U256::from_str_radix(stripped, 16)
        .map_err(|e| BridgeError::Rpc(format!("quantity {}: {}", quantity, e)))
}
