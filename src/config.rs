use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;

use crate::error::{BridgeError, Result};
use crate::hd::DEFAULT_DERIVATION_PATH;

/// Suffix under which nodes expose their EVM-style JSON-RPC endpoint.
pub const JSON_RPC_SUFFIX: &str = "/jsonrpc";

/// Network configuration for one provider instance.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Node URL. A trailing `/jsonrpc` suffix is stripped; the provider
    /// re-appends it for the EVM-style endpoint and uses the bare base for
    /// the fullnode API.
    pub url: String,
    /// Extra HTTP headers sent with every request (e.g. API keys).
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    /// Account credentials.
    pub accounts: Accounts,
}

/// Account credentials: an explicit key list, or one mnemonic-derived key.
/// Any other shape fails deserialization and is rejected at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Accounts {
    PrivateKeys(Vec<String>),
    Mnemonic(MnemonicAccounts),
}

/// Seed-phrase derivation descriptor producing exactly one key.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MnemonicAccounts {
    pub mnemonic: String,
    #[serde(default)]
    pub passphrase: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub initial_index: u32,
}

fn default_path() -> String {
    DEFAULT_DERIVATION_PATH.to_string()
}

impl NetworkConfig {
    /// The node base URL with any `/jsonrpc` suffix stripped.
    pub fn base_url(&self) -> String {
        normalize_rpc_url(&self.url)
    }

    /// The EVM-style JSON-RPC endpoint derived from the base URL.
    pub fn json_rpc_url(&self) -> String {
        format!("{}{}", self.base_url(), JSON_RPC_SUFFIX)
    }

    /// Configured headers as a [`HeaderMap`].
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.http_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BridgeError::InvalidAccountConfig(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| BridgeError::InvalidAccountConfig(format!("header value: {}", e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

/// Strip a trailing `/jsonrpc` (and trailing slashes) from a node URL.
pub fn normalize_rpc_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    trimmed
        .strip_suffix(JSON_RPC_SUFFIX)
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rpc_url() {
        assert_eq!(
            normalize_rpc_url("https://api.example.org/jsonrpc"),
            "https://api.example.org"
        );
        assert_eq!(
            normalize_rpc_url("https://api.example.org/jsonrpc/"),
            "https://api.example.org"
        );
        assert_eq!(
            normalize_rpc_url("https://api.example.org"),
            "https://api.example.org"
        );
    }

    #[test]
    fn test_accounts_shapes() {
        let keys: Accounts = serde_json::from_value(serde_json::json!(["0xab"])).unwrap();
        assert!(matches!(keys, Accounts::PrivateKeys(_)));

        let mnemonic: Accounts = serde_json::from_value(serde_json::json!({
            "mnemonic": "test test test",
            "initialIndex": 2
        }))
        .unwrap();
        match mnemonic {
            Accounts::Mnemonic(m) => {
                assert_eq!(m.path, DEFAULT_DERIVATION_PATH);
                assert_eq!(m.initial_index, 2);
                assert!(m.passphrase.is_empty());
            }
            other => panic!("unexpected shape: {other:?}"),
        }

        let bad = serde_json::from_value::<Accounts>(serde_json::json!(42));
        assert!(bad.is_err());
    }
}
