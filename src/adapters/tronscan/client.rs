//! TronScan Client
//!
//! Public TronScan API; works without a key, sends `TRON-PRO-API-KEY`
//! when one is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::types::{AccountInfo, TransactionInfo};
use crate::adapters::http::{ApiClient, HttpSettings};
use crate::domain::{
    scale_units, AccountSnapshot, ChainData, ChainFamily, ChainRecord, Identifier, Network,
    TokenTransfer, TransactionDetails, TxStatus,
};
use crate::ports::{ChainExplorer, SourceError};

const PROVIDER: &str = "tronscan";
const SUN_DECIMALS: u32 = 6;

/// Configuration for the TronscanClient
#[derive(Debug, Clone)]
pub struct TronscanConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub http: HttpSettings,
}

impl Default for TronscanConfig {
    fn default() -> Self {
        Self {
            api_url: "https://apilist.tronscanapi.com/api".to_string(),
            api_key: None,
            http: HttpSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TronscanClient {
    config: TronscanConfig,
    api: ApiClient,
}

impl TronscanClient {
    pub fn new(config: TronscanConfig) -> Result<Self, SourceError> {
        let api = ApiClient::new(PROVIDER, config.http.clone())?;
        Ok(Self { config, api })
    }

    pub async fn get_account(&self, address: &str) -> Result<AccountInfo, SourceError> {
        let url = format!("{}/account", self.config.api_url.trim_end_matches('/'));
        self.api
            .get_json(&url, &[("address", address.to_string())], &self.headers())
            .await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, SourceError> {
        let url = format!("{}/transaction-info", self.config.api_url.trim_end_matches('/'));
        self.api
            .get_json(&url, &[("hash", hash.to_string())], &self.headers())
            .await
    }

    fn headers(&self) -> Vec<(&'static str, String)> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => vec![("TRON-PRO-API-KEY", key.to_string())],
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl ChainExplorer for TronscanClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn family(&self) -> ChainFamily {
        ChainFamily::Tron
    }

    async fn fetch(&self, id: &Identifier, _networks: &[Network]) -> Result<ChainRecord, SourceError> {
        if id.is_address() {
            let info = self.get_account(id.as_str()).await?;
            normalize_account(id.as_str(), &info)
        } else {
            let info = self.get_transaction(id.as_str()).await?;
            normalize_transaction(id.as_str(), &info)
        }
    }
}

fn sun_to_trx(sun: u64) -> Result<Decimal, SourceError> {
    scale_units(sun as u128, SUN_DECIMALS)
        .ok_or_else(|| SourceError::MalformedResponse(format!("amount {} SUN out of range", sun)))
}

pub(crate) fn normalize_account(address: &str, info: &AccountInfo) -> Result<ChainRecord, SourceError> {
    // Some responses only list TRX under withPriceTokens
    let balance_sun = match info.balance {
        Some(sun) => sun,
        None => info
            .with_price_tokens
            .iter()
            .find(|t| t.token_abbr.as_deref().map(|s| s.eq_ignore_ascii_case("trx")).unwrap_or(false))
            .and_then(|t| t.balance.as_deref())
            .map(|b| {
                b.parse::<u64>().map_err(|_| {
                    SourceError::MalformedResponse(format!("TRX balance '{}' is not an integer", b))
                })
            })
            .transpose()?
            .ok_or_else(|| SourceError::NotFound(format!("account {} unknown to {}", address, PROVIDER)))?,
    };

    Ok(ChainRecord {
        source: PROVIDER.to_string(),
        network: Network::Tron,
        data: ChainData::Account(AccountSnapshot {
            address: address.to_string(),
            balance: sun_to_trx(balance_sun)?,
            balance_raw: balance_sun as u128,
            tx_count: info.total_transaction_count,
            recent: None,
        }),
    })
}

pub(crate) fn normalize_transaction(hash: &str, info: &TransactionInfo) -> Result<ChainRecord, SourceError> {
    if info.hash.is_none() {
        return Err(SourceError::NotFound(format!("transaction {} unknown to {}", hash, PROVIDER)));
    }

    let status = match (info.contract_ret.as_deref(), info.confirmed) {
        (Some("SUCCESS"), Some(false)) => TxStatus::Pending,
        (Some("SUCCESS"), _) => TxStatus::Success,
        (Some(_), _) => TxStatus::Failed,
        (None, Some(false)) => TxStatus::Pending,
        (None, _) => TxStatus::Unknown,
    };

    let transfers = info
        .trc20_transfer_info
        .iter()
        .map(|t| {
            let amount = match (t.amount_str.parse::<u128>(), t.decimals) {
                (Ok(raw), Some(decimals)) => scale_units(raw, decimals),
                _ => None,
            };
            TokenTransfer {
                from: t.from_address.clone(),
                to: t.to_address.clone(),
                contract: t.contract_address.clone(),
                raw_amount: t.amount_str.clone(),
                symbol: t.symbol.clone(),
                decimals: t.decimals,
                amount,
            }
        })
        .collect();

    Ok(ChainRecord {
        source: PROVIDER.to_string(),
        network: Network::Tron,
        data: ChainData::Transaction(TransactionDetails {
            hash: hash.to_lowercase(),
            status,
            block: info.block,
            timestamp: info.timestamp.and_then(DateTime::<Utc>::from_timestamp_millis),
            from: info.owner_address.clone(),
            to: info.to_address.clone(),
            value: info.contract_data.as_ref().and_then(|c| c.amount).map(sun_to_trx).transpose()?,
            fee: info.cost.as_ref().and_then(|c| c.total()).map(sun_to_trx).transpose()?,
            gas_used: None,
            transfers,
        }),
    })
}
