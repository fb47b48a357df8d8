use async_trait::async_trait;
use k256::ecdsa::SigningKey;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use super::types::*;
use crate::error::{BridgeError, Result};

/// The native fullnode surface the bridge consumes: address-aware
/// transaction builders, local signing, broadcast, and the lookups backing
/// fee estimation. Implementations are treated as an opaque service.
#[async_trait]
pub trait TronClient: Send + Sync {
    /// Build an unsigned native-asset transfer via the node's builder.
    async fn create_transfer(&self, transfer: &TransferArgs) -> Result<TronTransaction>;

    /// Build an unsigned create-contract transaction via the node's builder.
    async fn create_smart_contract(&self, create: &CreateContractArgs) -> Result<TronTransaction>;

    /// Sign a built transaction with the given key. Pure local operation.
    fn sign_transaction(&self, tx: &TronTransaction, key: &SigningKey) -> Result<TronTransaction>;

    /// Broadcast a signed transaction.
    async fn broadcast(&self, tx: &TronTransaction) -> Result<BroadcastResult>;

    /// Fetch a transaction by id. The raw node response is returned as-is;
    /// callers normalize the node's two failure signals.
    async fn get_transaction_by_id(&self, txid: &str) -> Result<TronTransaction>;

    /// Fetch contract info (energy factor et al.) for a deployed contract.
    async fn get_contract_info(&self, contract_hex: &str) -> Result<ContractInfo>;

    /// Estimate the energy a call would consume.
    async fn estimate_energy(&self, args: &EstimateEnergyArgs) -> Result<u64>;

    /// Fetch the committee chain parameters.
    async fn chain_parameters(&self) -> Result<Vec<ChainParameter>>;
}

/// HTTP client against the fullnode `wallet/*` API.
#[derive(Clone)]
pub struct HttpTronClient {
    http_client: Client,
    base_url: String,
}

impl HttpTronClient {
    /// Create a client for the given node base URL (no trailing slash
    /// required), sending `headers` with every request.
    pub fn new(base_url: &str, headers: HeaderMap) -> Result<Self> {
        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(BridgeError::Http)?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST a JSON body to a `wallet/*` endpoint and decode the response.
    async fn post<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("Sending fullnode request: {}", path);

        let response = self.http_client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Fullnode returned HTTP {}: {}", status, body);
            return Err(BridgeError::Native(format!(
                "{} returned HTTP {}: {}",
                path, status, body
            )));
        }

        let parsed = response
            .json::<R>()
            .await
            .map_err(|e| BridgeError::Native(format!("{} response: {}", path, e)))?;
        Ok(parsed)
    }
}

#[async_trait]
impl TronClient for HttpTronClient {
    async fn create_transfer(&self, transfer: &TransferArgs) -> Result<TronTransaction> {
        let tx: TronTransaction = self.post("wallet/createtransaction", transfer).await?;
        if let Some(err) = &tx.error {
            return Err(BridgeError::Native(format!("createtransaction: {}", err)));
        }
        Ok(tx)
    }

    async fn create_smart_contract(&self, create: &CreateContractArgs) -> Result<TronTransaction> {
        // deploycontract wraps the transaction in a `transaction` field on
        // some node versions and returns it bare on others.
        let value: serde_json::Value = self.post("wallet/deploycontract", create).await?;
        let tx_value = value.get("transaction").cloned().unwrap_or(value);
        let tx: TronTransaction = serde_json::from_value(tx_value)?;
        if let Some(err) = &tx.error {
            return Err(BridgeError::Native(format!("deploycontract: {}", err)));
        }
        Ok(tx)
    }

    fn sign_transaction(&self, tx: &TronTransaction, key: &SigningKey) -> Result<TronTransaction> {
        let digest = hex::decode(&tx.tx_id)
            .map_err(|e| BridgeError::Native(format!("transaction id hex: {}", e)))?;
        if digest.len() != 32 {
            return Err(BridgeError::Native(format!(
                "transaction id must be 32 bytes, got {}",
                digest.len()
            )));
        }

        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| BridgeError::Native(format!("signing failed: {}", e)))?;

        let mut sig_bytes = signature.to_bytes().to_vec();
        sig_bytes.push(27 + recovery_id.to_byte());

        let mut signed = tx.clone();
        signed.signature.push(hex::encode(sig_bytes));
        Ok(signed)
    }

    async fn broadcast(&self, tx: &TronTransaction) -> Result<BroadcastResult> {
        self.post("wallet/broadcasttransaction", tx).await
    }

    async fn get_transaction_by_id(&self, txid: &str) -> Result<TronTransaction> {
        let body = serde_json::json!({ "value": txid });
        self.post("wallet/gettransactionbyid", &body).await
    }

    async fn get_contract_info(&self, contract_hex: &str) -> Result<ContractInfo> {
        let body = serde_json::json!({ "value": contract_hex });
        self.post("wallet/getcontractinfo", &body).await
    }

    async fn estimate_energy(&self, args: &EstimateEnergyArgs) -> Result<u64> {
        let estimate: EnergyEstimate = self.post("wallet/estimateenergy", args).await?;
        if let Some(result) = &estimate.result {
            if result.result != Some(true) {
                let message = result
                    .message
                    .as_deref()
                    .map(decode_hex_message)
                    .unwrap_or_default();
                return Err(BridgeError::Native(format!(
                    "estimateenergy rejected: {}",
                    message
                )));
            }
        }
        estimate
            .energy_required
            .ok_or_else(|| BridgeError::Native("estimateenergy returned no estimate".to_string()))
    }

    async fn chain_parameters(&self) -> Result<Vec<ChainParameter>> {
        #[derive(serde::Deserialize)]
        struct ChainParameters {
            #[serde(rename = "chainParameter", default)]
            chain_parameter: Vec<ChainParameter>,
        }
        let body = serde_json::json!({});
        let params: ChainParameters = self.post("wallet/getchainparameters", &body).await?;
        Ok(params.chain_parameter)
    }
}
