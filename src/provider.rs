use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn};

use crate::clock::{Cached, Clock, SystemClock};
use crate::config::{Accounts, NetworkConfig};
use crate::error::{BridgeError, Result};
use crate::eth::client::{cached_gas_price, EthProvider, HttpEthProvider};
use crate::eth::tx::decode_raw_transaction;
use crate::eth::types::EthTransactionRequest;
use crate::hd::derive_private_key;
use crate::pending::{PendingTransaction, TransactionResponse};
use crate::signer::{TronSigner, INDEX_GRACE_MILLIS};
use crate::tron::address::{hash_from_hex, to_tron_hex};
use crate::tron::client::{HttpTronClient, TronClient};
use crate::tron::types::TransferArgs;

/// Raw values above this threshold are assumed to be 18-decimal EVM amounts
/// and are rescaled to the native 6-decimal convention.
pub const VALUE_RESCALE_THRESHOLD: u64 = 1_000_000_000;

/// Divisor taking an 18-decimal amount to the native 6-decimal unit.
pub const VALUE_RESCALE_DIVISOR: u64 = 1_000_000_000_000;

/// An EVM-style provider over the native chain: owns the signer registry,
/// reroutes simple transfers through the native transfer flow, and passes
/// everything else through to the delegate provider.
pub struct TronProvider {
    eth: Arc<dyn EthProvider>,
    tron: Arc<dyn TronClient>,
    clock: Arc<dyn Clock>,
    signers: RwLock<HashMap<Address, Arc<TronSigner>>>,
    gas_price: RwLock<Option<Cached<U256>>>,
}

impl TronProvider {
    /// Construct a provider for the configured endpoint, eagerly building
    /// one signer per configured account.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let headers = config.header_map()?;
        let eth = HttpEthProvider::new(&config.json_rpc_url(), headers.clone())?;
        let tron = HttpTronClient::new(&config.base_url(), headers)?;
        let provider = Self::with_parts(Arc::new(eth), Arc::new(tron), Arc::new(SystemClock::new()));
        provider.register_accounts(&config.accounts)?;
        Ok(provider)
    }

    /// Construct from explicit collaborators (used by tests and embedders).
    pub fn with_parts(
        eth: Arc<dyn EthProvider>,
        tron: Arc<dyn TronClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            eth,
            tron,
            clock,
            signers: RwLock::new(HashMap::new()),
            gas_price: RwLock::new(None),
        }
    }

    /// Register signers for the configured credentials: every explicit key,
    /// or exactly one mnemonic-derived key.
    pub fn register_accounts(&self, accounts: &Accounts) -> Result<()> {
        match accounts {
            Accounts::PrivateKeys(keys) => {
                if keys.is_empty() {
                    return Err(BridgeError::InvalidAccountConfig(
                        "empty private key list".to_string(),
                    ));
                }
                for key in keys {
                    self.add_signer(key)?;
                }
            }
            Accounts::Mnemonic(descriptor) => {
                let key = derive_private_key(
                    &descriptor.mnemonic,
                    &descriptor.passphrase,
                    &descriptor.path,
                    descriptor.initial_index,
                )?;
                self.register(TronSigner::from_key(
                    key,
                    self.tron.clone(),
                    self.eth.clone(),
                    self.clock.clone(),
                ));
            }
        }
        Ok(())
    }

    /// Register a signer for `private_key`, returning the existing one when
    /// the derived address is already present.
    pub fn add_signer(&self, private_key: &str) -> Result<Arc<TronSigner>> {
        let signer = TronSigner::new(
            private_key,
            self.tron.clone(),
            self.eth.clone(),
            self.clock.clone(),
        )?;
        Ok(self.register(signer))
    }

    fn register(&self, signer: TronSigner) -> Arc<TronSigner> {
        let mut signers = self.signers.write().expect("signer registry poisoned");
        signers
            .entry(signer.address())
            .or_insert_with(|| Arc::new(signer))
            .clone()
    }

    /// Look up the signer registered for `address`.
    pub fn get_signer(&self, address: Address) -> Result<Arc<TronSigner>> {
        self.signers
            .read()
            .expect("signer registry poisoned")
            .get(&address)
            .cloned()
            .ok_or(BridgeError::NoSigner(address))
    }

    /// Addresses with a registered signer.
    pub fn signer_addresses(&self) -> Vec<Address> {
        self.signers
            .read()
            .expect("signer registry poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// The native chain has no account nonces; this always returns `1`.
    /// Callers must not treat the result as a real nonce.
    pub fn get_transaction_count(&self, address: Address) -> u64 {
        warn!(
            "getTransactionCount({}) has no native equivalent; returning the constant 1",
            address
        );
        1
    }

    /// Current gas price, TTL-cached for 15 seconds, with a fixed default
    /// when the delegate yields nothing.
    pub async fn get_gas_price(&self) -> Result<U256> {
        cached_gas_price(self.eth.as_ref(), self.clock.as_ref(), &self.gas_price).await
    }

    /// Submit a raw signed transaction. Pure value transfers (no calldata,
    /// recoverable sender, recipient present) are rerouted through the
    /// native transfer flow; everything else passes through unmodified.
    pub async fn send_transaction(&self, raw: &[u8]) -> Result<TransactionResponse> {
        let decoded = decode_raw_transaction(raw)?;

        if decoded.data.is_empty() {
            if let (Some(to), Ok(from)) = (decoded.to, decoded.recover_sender()) {
                debug!(
                    "Rerouting simple transfer {} -> {} through the native flow",
                    from, to
                );
                return self.send_trx(from, to, decoded.value).await;
            }
        }

        let hash = self.eth.send_raw_transaction(raw).await?;
        let pending = PendingTransaction::new(hash, 0, self.eth.clone(), self.clock.clone());
        Ok(TransactionResponse::new(
            decoded.recover_sender().unwrap_or(Address::ZERO),
            decoded.to,
            decoded.value,
            pending,
        ))
    }

    /// Build, sign, and broadcast a native transfer, then fetch it back once
    /// the node has indexed it.
    pub async fn send_trx(
        &self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TransactionResponse> {
        let signer = self.get_signer(from)?;

        let amount = u64::try_from(rescale_value(value)).map_err(|_| {
            BridgeError::UnsupportedOperation("transfer amount exceeds native range".to_string())
        })?;

        let args = TransferArgs {
            owner_address: to_tron_hex(&from),
            to_address: to_tron_hex(&to),
            amount,
        };
        let tx = self.tron.create_transfer(&args).await?;
        let signed = signer.sign(&tx)?;
        let broadcast = self.tron.broadcast(&signed).await?;
        broadcast.ensure_accepted()?;

        info!(
            "Transfer broadcast ({}), waiting for the node to index it",
            signed.tx_id
        );
        self.clock.sleep_millis(INDEX_GRACE_MILLIS).await;

        let native = signer.get_tron_transaction(&signed.tx_id).await?;
        let hash = hash_from_hex(&native.tx_id)?;
        let pending = PendingTransaction::new(hash, 0, self.eth.clone(), self.clock.clone());
        Ok(TransactionResponse::new(
            from,
            Some(to),
            U256::from(amount),
            pending,
        ))
    }

    /// Estimate gas, stripping the fields the native chain has no semantics
    /// for (fee-market fields, transaction type, nonce).
    pub async fn estimate_gas(&self, request: &EthTransactionRequest) -> Result<U256> {
        let mut stripped = request.clone();
        stripped.tx_type = None;
        stripped.max_fee_per_gas = None;
        stripped.max_priority_fee_per_gas = None;
        stripped.nonce = None;
        self.eth.estimate_gas(&stripped).await
    }
}

/// Rescale an 18-decimal EVM amount to the native 6-decimal convention.
/// Values at or below the sanity threshold are passed through unchanged;
/// larger values are divided by 10^12 with native integer truncation.
pub fn rescale_value(value: U256) -> U256 {
    if value > U256::from(VALUE_RESCALE_THRESHOLD) {
        value / U256::from(VALUE_RESCALE_DIVISOR)
    } else {
        value
    }
}
