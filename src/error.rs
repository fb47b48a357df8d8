use alloy_primitives::{Address, B256};

use crate::eth::types::TransactionReceipt;

/// Crate-wide result alias.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Failure taxonomy of the bridge.
///
/// Broadcast, fetch, and confirmation failures surface to the caller of the
/// operation that detected them; none are retried internally. The remaining
/// variants are programmer or configuration errors and fail fast.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The fullnode rejected a broadcast (no truthy `result` field).
    #[error("broadcast rejected by node: code={code}, message={message}")]
    Broadcast {
        /// Native error code, e.g. `SIGERROR` or `CONTRACT_VALIDATE_ERROR`.
        code: String,
        /// Hex-decoded human-readable message from the node.
        message: String,
        /// Transaction id, when the node reported one.
        txid: Option<String>,
    },

    /// A native transaction lookup failed, via either of the node's two
    /// failure signals (transport error or `Error` result field).
    #[error("transaction lookup failed: {0}")]
    Fetch(String),

    /// Confirmation polling observed a terminal failure status on the receipt.
    #[error("transaction {hash} failed on chain")]
    TransactionFailed {
        hash: B256,
        receipt: Box<TransactionReceipt>,
    },

    /// No signer is registered for the requested address.
    #[error("no signer registered for address {0}")]
    NoSigner(Address),

    /// A transaction request carried a tag other than the two known shapes.
    #[error("unsupported transaction request: {0}")]
    UnsupportedOperation(String),

    /// Account credentials were neither a key list nor a mnemonic descriptor,
    /// or contained malformed key material.
    #[error("invalid account configuration: {0}")]
    InvalidAccountConfig(String),

    /// The native fullnode returned an HTTP error or an undecodable body.
    #[error("tron node error: {0}")]
    Native(String),

    /// The EVM-side JSON-RPC endpoint returned an error object.
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
