use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use tracing::debug;

use crate::clock::Clock;
use crate::error::{BridgeError, Result};
use crate::eth::client::EthProvider;
use crate::eth::types::TransactionReceipt;

/// Interval between confirmation polls.
pub const CONFIRMATION_POLL_MILLIS: u64 = 1_000;

/// A submitted transaction's polling handle: the hash, the confirmation
/// count observed at creation, and the provider/clock needed to re-poll.
#[derive(Clone)]
pub struct PendingTransaction {
    hash: B256,
    confirmations: u64,
    eth: Arc<dyn EthProvider>,
    clock: Arc<dyn Clock>,
}

impl PendingTransaction {
    pub fn new(
        hash: B256,
        confirmations: u64,
        eth: Arc<dyn EthProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            hash,
            confirmations,
            eth,
            clock,
        }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Poll until the transaction has at least `target` confirmations, then
    /// fetch its receipt. With no target the receipt is fetched immediately.
    ///
    /// No deadline is imposed here; wrap the future in
    /// `tokio::time::timeout` to bound it, and drop it to abandon polling.
    pub async fn wait(&self, target: Option<u64>) -> Result<TransactionReceipt> {
        if let Some(target) = target {
            let mut seen = self.confirmations;
            if seen < target {
                seen = self.eth.transaction_confirmations(self.hash).await?;
            }
            while seen < target {
                debug!(
                    "Transaction {} at {}/{} confirmations",
                    self.hash, seen, target
                );
                self.clock.sleep_millis(CONFIRMATION_POLL_MILLIS).await;
                seen = self.eth.transaction_confirmations(self.hash).await?;
            }
        }

        let receipt = self
            .eth
            .transaction_receipt(self.hash)
            .await?
            .ok_or_else(|| BridgeError::Fetch(format!("no receipt for {}", self.hash)))?;

        if !receipt.succeeded() {
            return Err(BridgeError::TransactionFailed {
                hash: self.hash,
                receipt: Box::new(receipt),
            });
        }
        Ok(receipt)
    }
}

impl fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("hash", &self.hash)
            .field("confirmations", &self.confirmations)
            .finish_non_exhaustive()
    }
}

/// An EVM-shaped transaction response with its polling handle attached.
#[derive(Clone)]
pub struct TransactionResponse {
    pub hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pending: PendingTransaction,
}

impl TransactionResponse {
    pub fn new(
        from: Address,
        to: Option<Address>,
        value: U256,
        pending: PendingTransaction,
    ) -> Self {
        Self {
            hash: pending.hash(),
            from,
            to,
            value,
            pending,
        }
    }

    /// Wait for `target` confirmations and return the receipt. See
    /// [`PendingTransaction::wait`].
    pub async fn wait(&self, target: Option<u64>) -> Result<TransactionReceipt> {
        self.pending.wait(target).await
    }

    pub fn pending(&self) -> &PendingTransaction {
        &self.pending
    }
}

impl fmt::Debug for TransactionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionResponse")
            .field("hash", &self.hash)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}
