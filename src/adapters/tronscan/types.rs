//! TronScan Response Types
//!
//! TronScan answers `{}` (HTTP 200) for unknown accounts and transactions,
//! so nearly every field is optional and absence is checked by the client.

use serde::Deserialize;

/// `GET /account?address=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub address: Option<String>,
    /// Balance in SUN
    #[serde(default)]
    pub balance: Option<u64>,
    #[serde(default)]
    pub total_transaction_count: Option<u64>,
    #[serde(default)]
    pub with_price_tokens: Vec<PriceToken>,
}

/// Token holding as listed under `withPriceTokens`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceToken {
    #[serde(default)]
    pub token_abbr: Option<String>,
    /// Amount in the token's base units, as a string
    #[serde(default)]
    pub balance: Option<String>,
}

/// `GET /transaction-info?hash=`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub block: Option<u64>,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub to_address: Option<String>,
    #[serde(default)]
    pub confirmed: Option<bool>,
    /// "SUCCESS", "REVERT", "OUT_OF_ENERGY", ...
    #[serde(default)]
    pub contract_ret: Option<String>,
    #[serde(default)]
    pub cost: Option<Cost>,
    #[serde(default)]
    pub contract_data: Option<ContractData>,
    #[serde(default)]
    pub trc20_transfer_info: Vec<Trc20Transfer>,
}

/// Resource cost, all in SUN
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cost {
    #[serde(default)]
    pub fee: Option<u64>,
    #[serde(default)]
    pub net_fee: Option<u64>,
    #[serde(default)]
    pub energy_fee: Option<u64>,
}

impl Cost {
    /// Total fee in SUN
    pub fn total(&self) -> Option<u64> {
        self.fee.or_else(|| match (self.net_fee, self.energy_fee) {
            (None, None) => None,
            (net, energy) => Some(net.unwrap_or(0).saturating_add(energy.unwrap_or(0))),
        })
    }
}

/// Contract parameters; `amount` is present for plain TRX transfers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractData {
    #[serde(default)]
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Trc20Transfer {
    pub from_address: String,
    pub to_address: String,
    pub contract_address: String,
    pub amount_str: String,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub symbol: Option<String>,
}
