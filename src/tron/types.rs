use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Divisor applied to energy factors so fee arithmetic stays in integers:
/// a factor of 1.0 is carried as 1000.
pub const ENERGY_FACTOR_DIVISOR: u64 = 1_000;

/// Ceiling on the per-contract energy factor, in milli-units: a surcharge
/// of 3.4x over the base price, the dynamic-energy maximum. A node-reported
/// factor at or above this is never trusted.
pub const MAX_ENERGY_FACTOR_MILLIS: u64 = 3_400;

/// Chain parameter key carrying the network-wide fee-limit cap.
pub const MAX_FEE_LIMIT_KEY: &str = "getMaxFeeLimit";

/// A transaction as the fullnode represents it.
///
/// The node builds `raw_data` itself; this crate only ever signs the id and
/// appends to `signature`. Lookup failures are signaled inconsistently: some
/// paths raise a transport error, others return `{"Error": "..."}` — the
/// `error` field captures the latter so callers can normalize both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TronTransaction {
    #[serde(rename = "txID", default)]
    pub tx_id: String,
    #[serde(default)]
    pub raw_data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_data_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signature: Vec<String>,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of `wallet/broadcasttransaction`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BroadcastResult {
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(default)]
    pub code: Option<String>,
    /// Hex-encoded error message.
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub txid: Option<String>,
}

impl BroadcastResult {
    /// Enforce the acceptance contract: anything without a truthy `result`
    /// field is a rejection, whatever else the node included.
    pub fn ensure_accepted(&self) -> Result<()> {
        if self.result == Some(true) {
            return Ok(());
        }
        Err(BridgeError::Broadcast {
            code: self.code.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
            message: self
                .message
                .as_deref()
                .map(decode_hex_message)
                .unwrap_or_default(),
            txid: self.txid.clone(),
        })
    }
}

/// Decode a hex-encoded node message to text, falling back to the raw hex
/// when it is not valid UTF-8.
pub fn decode_hex_message(message: &str) -> String {
    match hex::decode(message) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| message.to_string()),
        Err(_) => message.to_string(),
    }
}

/// Result of `wallet/getcontractinfo`, reduced to what the bridge consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractInfo {
    #[serde(default)]
    pub contract_state: Option<ContractState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractState {
    /// Dynamic energy factor in the node's 10_000-precision units.
    #[serde(default)]
    pub energy_factor: Option<u64>,
    #[serde(default)]
    pub update_cycle: Option<u64>,
}

impl ContractInfo {
    /// The published factor in milli-units, when the node reported one.
    /// The node's field has precision 10_000 and encodes the surcharge over
    /// the base price, so `2000` means +0.2x, which is 200 milli-units.
    pub fn energy_factor_millis(&self) -> Option<u64> {
        let raw = self.contract_state.as_ref()?.energy_factor?;
        Some(raw / 10)
    }
}

/// One entry of `wallet/getchainparameters`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChainParameter {
    pub key: String,
    #[serde(default)]
    pub value: Option<i64>,
}

/// Find a chain parameter by key.
pub fn chain_parameter(params: &[ChainParameter], key: &str) -> Option<i64> {
    params.iter().find(|p| p.key == key).and_then(|p| p.value)
}

/// Arguments for the native create-contract builder
/// (`wallet/deploycontract`), produced from a [`CreateContractRequest`]
/// once the transient request fields are stripped.
///
/// [`CreateContractRequest`]: crate::deploy::CreateContractRequest
#[derive(Debug, Clone, Serialize)]
pub struct CreateContractArgs {
    pub owner_address: String,
    pub abi: String,
    pub bytecode: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parameter: String,
    pub name: String,
    pub fee_limit: u64,
    pub call_value: u64,
    pub consume_user_resource_percent: u8,
    pub origin_energy_limit: u64,
}

/// Arguments for the native transfer builder (`wallet/createtransaction`).
#[derive(Debug, Clone, Serialize)]
pub struct TransferArgs {
    pub owner_address: String,
    pub to_address: String,
    /// Amount in the native 6-decimal unit (sun).
    pub amount: u64,
}

/// Arguments for `wallet/estimateenergy`.
#[derive(Debug, Clone, Serialize)]
pub struct EstimateEnergyArgs {
    pub owner_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_value: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnergyEstimate {
    #[serde(default)]
    pub result: Option<EstimateResult>,
    #[serde(default)]
    pub energy_required: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EstimateResult {
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_rejection_decodes_message() {
        let result = BroadcastResult {
            result: None,
            code: Some("SIGERROR".to_string()),
            message: Some(hex::encode("validate signature error")),
            txid: Some("ab".repeat(32)),
        };
        let err = result.ensure_accepted().unwrap_err();
        match err {
            BridgeError::Broadcast {
                code,
                message,
                txid,
            } => {
                assert_eq!(code, "SIGERROR");
                assert_eq!(message, "validate signature error");
                assert_eq!(txid.unwrap().len(), 64);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_false_result_is_rejection() {
        let result = BroadcastResult {
            result: Some(false),
            ..Default::default()
        };
        assert!(result.ensure_accepted().is_err());
        let ok = BroadcastResult {
            result: Some(true),
            ..Default::default()
        };
        assert!(ok.ensure_accepted().is_ok());
    }

    #[test]
    fn test_energy_factor_conversion() {
        let info = ContractInfo {
            contract_state: Some(ContractState {
                energy_factor: Some(2_000),
                update_cycle: None,
            }),
        };
        assert_eq!(info.energy_factor_millis(), Some(200));

        let absent = ContractInfo::default();
        assert_eq!(absent.energy_factor_millis(), None);
    }

    #[test]
    fn test_chain_parameter_lookup() {
        let params = vec![
            ChainParameter {
                key: "getEnergyFee".to_string(),
                value: Some(420),
            },
            ChainParameter {
                key: MAX_FEE_LIMIT_KEY.to_string(),
                value: Some(15_000_000_000),
            },
        ];
        assert_eq!(
            chain_parameter(&params, MAX_FEE_LIMIT_KEY),
            Some(15_000_000_000)
        );
        assert_eq!(chain_parameter(&params, "missing"), None);
    }
}
