pub mod client;
pub mod tx;
pub mod types;

pub use client::{EthProvider, HttpEthProvider, DEFAULT_GAS_PRICE};
pub use tx::{decode_raw_transaction, DecodedTransaction};
pub use types::{EthTransactionRequest, TransactionReceipt};
