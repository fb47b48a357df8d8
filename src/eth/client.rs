use std::sync::RwLock;

use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::{debug, error};

use super::types::*;
use crate::clock::{Cached, Clock, GAS_PRICE_TTL_MILLIS};
use crate::error::{BridgeError, Result};

/// Fallback price (in sun) when the endpoint yields no gas price.
pub const DEFAULT_GAS_PRICE: u64 = 1_000;

/// The EVM-style provider contract the bridge delegates unmodified
/// operations to, and polls confirmations through.
#[async_trait]
pub trait EthProvider: Send + Sync {
    /// Current gas price; `None` when the endpoint has no answer.
    async fn gas_price(&self) -> Result<Option<U256>>;

    /// Estimate gas for a call object.
    async fn estimate_gas(&self, request: &EthTransactionRequest) -> Result<U256>;

    /// Submit an EVM-shaped transaction request, returning its hash.
    async fn send_transaction(&self, request: &EthTransactionRequest) -> Result<B256>;

    /// Submit a raw signed transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256>;

    /// Blocks mined on top of the transaction's block, inclusive
    /// (1 as soon as it is mined, 0 while pending or unknown).
    async fn transaction_confirmations(&self, hash: B256) -> Result<u64>;

    /// Fetch the receipt, `None` while the transaction is pending.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;
}

/// JSON-RPC 2.0 client against an EVM-style endpoint.
#[derive(Clone)]
pub struct HttpEthProvider {
    http_client: Client,
    rpc_url: String,
}

impl HttpEthProvider {
    /// Create a client for the given JSON-RPC URL, sending `headers` with
    /// every request.
    pub fn new(rpc_url: &str, headers: HeaderMap) -> Result<Self> {
        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(BridgeError::Http)?;
        Ok(Self {
            http_client,
            rpc_url: rpc_url.to_string(),
        })
    }

    /// Send a JSON-RPC request and unwrap the result field.
    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        debug!("Sending JSON-RPC request: method={}", method);
        let request = JsonRpcRequest::new(method, params);

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("JSON-RPC endpoint returned HTTP {}: {}", status, body);
            return Err(BridgeError::Rpc(format!(
                "{} returned HTTP {}: {}",
                method, status, body
            )));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Rpc(format!("{} response: {}", method, e)))?;

        if let Some(err) = rpc_response.error {
            error!("JSON-RPC error: code={}, message={}", err.code, err.message);
            return Err(BridgeError::Rpc(format!(
                "{} error {}: {}",
                method, err.code, err.message
            )));
        }

        Ok(rpc_response.result.unwrap_or(serde_json::Value::Null))
    }

    async fn block_number(&self) -> Result<u64> {
        let result = self.call("eth_blockNumber", serde_json::json!([])).await?;
        match result.as_str() {
            Some(quantity) => parse_quantity(quantity),
            None => Err(BridgeError::Rpc("eth_blockNumber returned no quantity".to_string())),
        }
    }
}

#[async_trait]
impl EthProvider for HttpEthProvider {
    async fn gas_price(&self) -> Result<Option<U256>> {
        let result = self.call("eth_gasPrice", serde_json::json!([])).await?;
        match result.as_str() {
            Some(quantity) => Ok(Some(parse_quantity_u256(quantity)?)),
            None => Ok(None),
        }
    }

    async fn estimate_gas(&self, request: &EthTransactionRequest) -> Result<U256> {
        let params = serde_json::json!([request]);
        let result = self.call("eth_estimateGas", params).await?;
        match result.as_str() {
            Some(quantity) => parse_quantity_u256(quantity),
            None => Err(BridgeError::Rpc("eth_estimateGas returned no quantity".to_string())),
        }
    }

    async fn send_transaction(&self, request: &EthTransactionRequest) -> Result<B256> {
        let params = serde_json::json!([request]);
        let result = self.call("eth_sendTransaction", params).await?;
        parse_hash(&result, "eth_sendTransaction")
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256> {
        let params = serde_json::json!([format!("0x{}", hex::encode(raw))]);
        let result = self.call("eth_sendRawTransaction", params).await?;
        parse_hash(&result, "eth_sendRawTransaction")
    }

    async fn transaction_confirmations(&self, hash: B256) -> Result<u64> {
        let params = serde_json::json!([format!("{hash}")]);
        let result = self.call("eth_getTransactionByHash", params).await?;

        let mined_in = result
            .get("blockNumber")
            .and_then(|v| v.as_str())
            .map(parse_quantity)
            .transpose()?;

        match mined_in {
            None => Ok(0),
            Some(block) => {
                let latest = self.block_number().await?;
                Ok(latest.saturating_sub(block) + 1)
            }
        }
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        let params = serde_json::json!([format!("{hash}")]);
        let result = self.call("eth_getTransactionReceipt", params).await?;
        if result.is_null() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(result)?))
    }
}

fn parse_hash(result: &serde_json::Value, method: &str) -> Result<B256> {
    let text = result
        .as_str()
        .ok_or_else(|| BridgeError::Rpc(format!("{} returned no hash", method)))?;
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    let bytes =
        hex::decode(stripped).map_err(|e| BridgeError::Rpc(format!("{} hash: {}", method, e)))?;
    if bytes.len() != 32 {
        return Err(BridgeError::Rpc(format!(
            "{} hash must be 32 bytes, got {}",
            method,
            bytes.len()
        )));
    }
    Ok(B256::from_slice(&bytes))
}

/// Read-through gas-price cache shared by the provider and its signers.
///
/// Returns the cached value while fresh; otherwise queries the delegate,
/// falls back to [`DEFAULT_GAS_PRICE`] when it yields nothing, and
/// overwrites the cell with the current timestamp.
pub(crate) async fn cached_gas_price(
    eth: &dyn EthProvider,
    clock: &dyn Clock,
    cell: &RwLock<Option<Cached<U256>>>,
) -> Result<U256> {
    let now = clock.now_millis();
    if let Some(cached) = cell.read().expect("gas price cache poisoned").as_ref() {
        if cached.is_fresh(now, GAS_PRICE_TTL_MILLIS) {
            return Ok(cached.value);
        }
    }

    let price = eth
        .gas_price()
        .await?
        .unwrap_or_else(|| U256::from(DEFAULT_GAS_PRICE));
    *cell.write().expect("gas price cache poisoned") = Some(Cached::new(now, price));
    Ok(price)
}
