pub mod address;
pub mod client;
pub mod types;

pub use address::to_tron_hex;
pub use client::{HttpTronClient, TronClient};
pub use types::{
    BroadcastResult, ChainParameter, ContractInfo, CreateContractArgs, EstimateEnergyArgs,
    TransferArgs, TronTransaction, ENERGY_FACTOR_DIVISOR, MAX_ENERGY_FACTOR_MILLIS,
};
