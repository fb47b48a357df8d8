//! Tron Bridge
//!
//! This crate bridges EVM-shaped tooling onto the Tron network. EVM-style
//! transaction requests are translated into native Tron transactions, signed
//! locally, and broadcast through the node's wallet API, while queries and
//! receipts flow back through the node's EVM-compatible JSON-RPC endpoint
//! and are normalized into the shapes EVM tooling expects.
//!
//! # Architecture
//!
//! ```text
//! EVM tooling (wallets, deploy scripts, test harnesses)
//!     |
//!     | EVM-shaped transaction requests
//!     v
//! Tron Bridge (this crate)
//!     |                         |
//!     | wallet/* HTTP calls     | eth_* JSON-RPC calls
//!     v                         v
//! Tron full node (wallet API + /jsonrpc endpoint)
//! ```
//!
//! # Modules
//!
//! - `config` - Network endpoint and account configuration
//! - `provider` - EVM-style provider with the signer registry and transfer rerouting
//! - `signer` - Per-account signing, fee-limit estimation, contract creation
//! - `deploy` - Deployment request construction and dispatch tagging
//! - `pending` - Pending-transaction handles and confirmation polling
//! - `tron` - Native node client, wire types, address conversion
//! - `eth` - EVM JSON-RPC client, wire types, raw transaction decoding
//! - `hd` - BIP-39/BIP-32 key derivation for mnemonic accounts
//! - `clock` - Injectable time source and TTL cache cells
//! - `error` - Crate-wide error type

pub mod clock;
pub mod config;
pub mod deploy;
pub mod error;
pub mod eth;
pub mod hd;
pub mod pending;
pub mod provider;
pub mod signer;
pub mod tron;

pub use config::{Accounts, NetworkConfig};
pub use deploy::{build_deploy_request, TransactionRequest};
pub use error::{BridgeError, Result};
pub use pending::{PendingTransaction, TransactionResponse};
pub use provider::TronProvider;
pub use signer::TronSigner;
