use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use alloy_primitives::{Address, B256, U256};
use k256::ecdsa::SigningKey;
use tracing::{debug, info};

use crate::clock::{Cached, Clock, ENERGY_FACTOR_TTL_MILLIS};
use crate::deploy::{CreateContractRequest, TransactionRequest};
use crate::error::{BridgeError, Result};
use crate::eth::client::{cached_gas_price, EthProvider};
use crate::eth::types::EthTransactionRequest;
use crate::pending::{PendingTransaction, TransactionResponse};
use crate::tron::address::{address_from_key, hash_from_hex, key_from_hex, to_tron_hex};
use crate::tron::client::TronClient;
use crate::tron::types::{
    chain_parameter, CreateContractArgs, EstimateEnergyArgs, TronTransaction,
    ENERGY_FACTOR_DIVISOR, MAX_ENERGY_FACTOR_MILLIS, MAX_FEE_LIMIT_KEY,
};

/// Grace period between broadcast and the first lookup: the node needs time
/// to index the transaction before it is queryable.
pub const INDEX_GRACE_MILLIS: u64 = 5_000;

/// One private key bound to the native chain: builds, signs, and broadcasts
/// create-contract transactions, and estimates fee limits from resource
/// consumption and the per-contract energy factor.
pub struct TronSigner {
    key: SigningKey,
    address: Address,
    tron: Arc<dyn TronClient>,
    eth: Arc<dyn EthProvider>,
    clock: Arc<dyn Clock>,
    gas_price: RwLock<Option<Cached<U256>>>,
    energy_factors: RwLock<HashMap<Address, Cached<u64>>>,
}

impl TronSigner {
    pub fn new(
        private_key: &str,
        tron: Arc<dyn TronClient>,
        eth: Arc<dyn EthProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let key = key_from_hex(private_key)?;
        Ok(Self::from_key(key, tron, eth, clock))
    }

    pub fn from_key(
        key: SigningKey,
        tron: Arc<dyn TronClient>,
        eth: Arc<dyn EthProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let address = address_from_key(&key);
        Self {
            key,
            address,
            tron,
            eth,
            clock,
            gas_price: RwLock::new(None),
            energy_factors: RwLock::new(HashMap::new()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a built native transaction. Pure delegation to the native
    /// signing primitive; no caching.
    pub fn sign(&self, tx: &TronTransaction) -> Result<TronTransaction> {
        self.tron.sign_transaction(tx, &self.key)
    }

    /// Submit a transaction request: create-contract requests run through
    /// [`create`](Self::create), ordinary requests pass straight through to
    /// the delegate provider.
    pub async fn send_transaction(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionResponse> {
        match request {
            TransactionRequest::CreateContract(create) => self.create(create).await,
            TransactionRequest::Ethereum(ordinary) => {
                let hash = self.eth.send_transaction(&ordinary).await?;
                Ok(self.response(hash, ordinary.to, ordinary.value.unwrap_or(U256::ZERO)))
            }
        }
    }

    /// Build, sign, and broadcast a create-contract transaction, then fetch
    /// it back once the node has indexed it. A request that leaves the fee
    /// limit unset is priced via [`get_fee_limit`](Self::get_fee_limit)
    /// before the builder sees it.
    pub async fn create(&self, request: CreateContractRequest) -> Result<TransactionResponse> {
        let value = U256::from(request.call_value);
        let mut args = request.into_args(to_tron_hex(&self.address));
        if args.fee_limit == 0 {
            args.fee_limit = self.deploy_fee_limit(&args).await?;
        }

        let tx = self.tron.create_smart_contract(&args).await?;
        let signed = self.sign(&tx)?;
        let broadcast = self.tron.broadcast(&signed).await?;
        broadcast.ensure_accepted()?;

        let txid = if signed.tx_id.is_empty() {
            broadcast.txid.clone().unwrap_or_default()
        } else {
            signed.tx_id.clone()
        };
        info!(
            "Contract creation broadcast ({}), waiting for the node to index it",
            txid
        );
        self.clock.sleep_millis(INDEX_GRACE_MILLIS).await;

        let native = self.get_tron_transaction(&txid).await?;
        let hash = hash_from_hex(&native.tx_id)?;
        Ok(self.response(hash, None, value))
    }

    /// Compute the fee limit for an unsigned transaction:
    /// `consumption x (1 + factor) x price`, in scaled-integer arithmetic,
    /// capped by the network-wide maximum when the node exposes one.
    pub async fn get_fee_limit(
        &self,
        tx: &EthTransactionRequest,
        overrides: Option<&EthTransactionRequest>,
    ) -> Result<u64> {
        let consumption = match overrides.and_then(|o| o.gas) {
            Some(gas) => u128::try_from(gas).map_err(|_| {
                BridgeError::UnsupportedOperation("gas override exceeds native range".to_string())
            })?,
            None => u128::from(self.estimate_consumption(tx).await?),
        };

        let factor = self.get_energy_factor(tx.to).await?;
        let price = cached_gas_price(self.eth.as_ref(), self.clock.as_ref(), &self.gas_price)
            .await
            .and_then(|p| {
                u128::try_from(p).map_err(|_| {
                    BridgeError::Rpc("gas price exceeds native range".to_string())
                })
            })?;

        let raw = scaled_fee(consumption, factor, price);

        let params = self.tron.chain_parameters().await?;
        let capped = match chain_parameter(&params, MAX_FEE_LIMIT_KEY) {
            Some(max) if max >= 0 => raw.min(max as u128),
            _ => raw,
        };
        debug!(
            "Fee limit: consumption={}, factor={}, price={}, raw={}, capped={}",
            consumption, factor, price, raw, capped
        );
        Ok(u64::try_from(capped).unwrap_or(u64::MAX))
    }

    /// Per-contract energy factor in milli-units, cache-first with a
    /// 10-minute TTL. The empty address (contract creation) always yields
    /// the ceiling without a network round-trip, and a node-reported factor
    /// at or above the ceiling is clamped to it.
    pub async fn get_energy_factor(&self, contract: Option<Address>) -> Result<u64> {
        let contract = match contract {
            None => return Ok(MAX_ENERGY_FACTOR_MILLIS),
            Some(address) if address == Address::ZERO => return Ok(MAX_ENERGY_FACTOR_MILLIS),
            Some(address) => address,
        };

        let now = self.clock.now_millis();
        if let Some(cached) = self
            .energy_factors
            .read()
            .expect("energy factor cache poisoned")
            .get(&contract)
        {
            if cached.is_fresh(now, ENERGY_FACTOR_TTL_MILLIS) {
                return Ok(cached.value);
            }
        }

        let info = self.tron.get_contract_info(&to_tron_hex(&contract)).await?;
        let factor = match info.energy_factor_millis() {
            Some(factor) if factor < MAX_ENERGY_FACTOR_MILLIS => factor,
            _ => MAX_ENERGY_FACTOR_MILLIS,
        };
        self.energy_factors
            .write()
            .expect("energy factor cache poisoned")
            .insert(contract, Cached::new(now, factor));
        Ok(factor)
    }

    /// Fetch a native transaction by id, normalizing the node's two failure
    /// signals (transport error, `Error` result field) into one.
    pub async fn get_tron_transaction(&self, txid: &str) -> Result<TronTransaction> {
        let tx = self
            .tron
            .get_transaction_by_id(txid)
            .await
            .map_err(|e| BridgeError::Fetch(e.to_string()))?;
        if let Some(error) = tx.error {
            return Err(BridgeError::Fetch(error));
        }
        if tx.tx_id.is_empty() {
            return Err(BridgeError::Fetch(format!("transaction {} not found", txid)));
        }
        Ok(tx)
    }

    /// Fee limit for a deployment the caller left unpriced: consumption is
    /// estimated from the deployment payload, and contract creation always
    /// carries the factor ceiling.
    async fn deploy_fee_limit(&self, args: &CreateContractArgs) -> Result<u64> {
        let estimate = EthTransactionRequest {
            data: Some(format!("{}{}", args.bytecode, args.parameter)),
            value: (args.call_value > 0).then(|| U256::from(args.call_value)),
            ..Default::default()
        };
        self.get_fee_limit(&estimate, None).await
    }

    async fn estimate_consumption(&self, tx: &EthTransactionRequest) -> Result<u64> {
        let call_value = tx
            .value
            .map(u64::try_from)
            .transpose()
            .map_err(|_| BridgeError::UnsupportedOperation("value exceeds native range".to_string()))?;
        let args = EstimateEnergyArgs {
            owner_address: to_tron_hex(&self.address),
            contract_address: tx.to.map(|to| to_tron_hex(&to)),
            data: tx.data_bytes().map(hex::encode)?,
            call_value,
        };
        self.tron.estimate_energy(&args).await
    }

    pub(crate) fn response(
        &self,
        hash: B256,
        to: Option<Address>,
        value: U256,
    ) -> TransactionResponse {
        let pending = PendingTransaction::new(hash, 0, self.eth.clone(), self.clock.clone());
        TransactionResponse::new(self.address, to, value, pending)
    }
}

impl fmt::Debug for TronSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TronSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// `consumption x (1000 + factor_millis) x price / 1000`, the fixed-divisor
/// rendition of `consumption x (1 + factor) x price`. Native fee units can
/// exceed the double-precision safe-integer range, so this stays in `u128`.
pub fn scaled_fee(consumption: u128, factor_millis: u64, price: u128) -> u128 {
    consumption * (u128::from(ENERGY_FACTOR_DIVISOR) + u128::from(factor_millis)) * price
        / u128::from(ENERGY_FACTOR_DIVISOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_fee_hand_example() {
        // consumption=1000, factor=0.2, price=1000 => 1_200_000
        assert_eq!(scaled_fee(1_000, 200, 1_000), 1_200_000);
        assert_eq!(scaled_fee(1_000, 0, 1_000), 1_000_000);
        // Stays exact beyond f64's 2^53 safe-integer range.
        assert_eq!(
            scaled_fee(1 << 53, 500, 1_000),
            (1u128 << 53) * 1_500
        );
    }
}
