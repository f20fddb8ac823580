//! Etherscan V2 Response Types
//!
//! Typed schemas for the proxy (JSON-RPC passthrough) and account modules.
//! Every payload goes through `Envelope::into_result`, which sorts provider
//! errors from data before the `result` field is decoded.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::ports::SourceError;

const PROVIDER: &str = "etherscan";

/// JSON-RPC error object
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Common wrapper around every Etherscan answer.
///
/// Proxy calls answer `{"jsonrpc":"2.0","id":1,"result":...}`; account calls
/// and provider-level failures answer `{"status":"0|1","message":...,"result":...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl Envelope {
    /// Decode `result` as `T`; `Ok(None)` when the provider returned null
    pub fn into_result<T: DeserializeOwned>(self) -> Result<Option<T>, SourceError> {
        if let Some(err) = self.error {
            if is_rate_limit(&err.message) {
                return Err(rate_limited());
            }
            return Err(SourceError::Rejected(format!(
                "{} RPC error {}: {}",
                PROVIDER, err.code, err.message
            )));
        }

        if self.status.as_deref() == Some("0") {
            let detail = match &self.result {
                Some(Value::String(s)) => s.clone(),
                _ => self.message.clone().unwrap_or_default(),
            };
            if is_rate_limit(&detail) || self.message.as_deref().map(is_rate_limit).unwrap_or(false) {
                return Err(rate_limited());
            }
            // "No transactions found" comes back as status 0 with an empty list
            if !matches!(self.result, Some(Value::Array(_))) {
                return Err(SourceError::Rejected(format!("{}: {}", PROVIDER, detail)));
            }
        }

        match self.result {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| SourceError::MalformedResponse(format!("{} result: {}", PROVIDER, e))),
        }
    }
}

fn is_rate_limit(text: &str) -> bool {
    text.to_ascii_lowercase().contains("rate limit")
}

fn rate_limited() -> SourceError {
    SourceError::RateLimited {
        provider: PROVIDER.to_string(),
    }
}

/// `eth_getTransactionReceipt` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub gas_used: Option<String>,
    #[serde(default)]
    pub effective_gas_price: Option<String>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

/// Receipt log entry
#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
}

/// `eth_getTransactionByHash` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// `eth_getBlockByNumber` result (only the fields the report uses)
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub timestamp: String,
}

/// `account/txlist` entry
#[derive(Debug, Clone, Deserialize)]
pub struct AccountTx {
    pub hash: String,
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// Wei, decimal string
    pub value: String,
    #[serde(rename = "timeStamp")]
    pub time_stamp: String,
    #[serde(rename = "isError", default)]
    pub is_error: String,
}
