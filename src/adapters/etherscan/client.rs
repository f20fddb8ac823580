//! Etherscan V2 Client
//!
//! One API key covers every EVM chain through the `chainid` parameter.
//! Balances and activity come from the `proxy` and `account` modules;
//! transactions are read from their receipt, with ERC-20 transfers decoded
//! from the receipt logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::types::{AccountTx, Block, Envelope, Log, Receipt, RpcTransaction};
use crate::adapters::http::{parse_hex_u128, parse_hex_u64, ApiClient, HttpSettings};
use crate::domain::{
    scale_units, AccountSnapshot, ChainData, ChainFamily, ChainRecord, Identifier, Network,
    RecentTransaction, TokenTransfer, TransactionDetails, TxStatus,
};
use crate::ports::{ChainExplorer, SourceError};

/// keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

const PROVIDER: &str = "etherscan";

/// Configuration for the EtherscanClient
#[derive(Debug, Clone)]
pub struct EtherscanConfig {
    /// Etherscan V2 endpoint
    pub api_url: String,
    pub api_key: String,
    pub http: HttpSettings,
    /// How many recent transactions to list for an address
    pub recent_tx_limit: u32,
}

impl EtherscanConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.etherscan.io/v2/api".to_string(),
            api_key: api_key.into(),
            http: HttpSettings::default(),
            recent_tx_limit: 25,
        }
    }

    /// Create config pointing at a custom endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Client for the Etherscan V2 multichain API
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    config: EtherscanConfig,
    api: ApiClient,
}

impl EtherscanClient {
    pub fn new(config: EtherscanConfig) -> Result<Self, SourceError> {
        let api = ApiClient::new(PROVIDER, config.http.clone())?;
        Ok(Self { config, api })
    }

    pub fn api_url(&self) -> &str {
        &self.config.api_url
    }

    /// Native balance in wei
    pub async fn get_balance(&self, network: Network, address: &str) -> Result<u128, SourceError> {
        let hex: String = self
            .call(network, &[
                ("module", "proxy".into()),
                ("action", "eth_getBalance".into()),
                ("address", address.into()),
                ("tag", "latest".into()),
            ])
            .await?
            .ok_or_else(|| SourceError::MalformedResponse("eth_getBalance returned null".into()))?;
        parse_hex_u128(&hex)
    }

    /// Outgoing transaction count (nonce)
    pub async fn get_transaction_count(&self, network: Network, address: &str) -> Result<u64, SourceError> {
        let hex: String = self
            .call(network, &[
                ("module", "proxy".into()),
                ("action", "eth_getTransactionCount".into()),
                ("address", address.into()),
                ("tag", "latest".into()),
            ])
            .await?
            .ok_or_else(|| SourceError::MalformedResponse("eth_getTransactionCount returned null".into()))?;
        parse_hex_u64(&hex)
    }

    /// Newest transactions touching `address`
    pub async fn get_recent_transactions(
        &self,
        network: Network,
        address: &str,
    ) -> Result<Vec<AccountTx>, SourceError> {
        let txs: Option<Vec<AccountTx>> = self
            .call(network, &[
                ("module", "account".into()),
                ("action", "txlist".into()),
                ("address", address.into()),
                ("page", "1".into()),
                ("offset", self.config.recent_tx_limit.to_string()),
                ("sort", "desc".into()),
            ])
            .await?;
        Ok(txs.unwrap_or_default())
    }

    pub async fn get_receipt(&self, network: Network, hash: &str) -> Result<Option<Receipt>, SourceError> {
        self.call(network, &[
            ("module", "proxy".into()),
            ("action", "eth_getTransactionReceipt".into()),
            ("txhash", hash.into()),
        ])
        .await
    }

    pub async fn get_transaction(&self, network: Network, hash: &str) -> Result<Option<RpcTransaction>, SourceError> {
        self.call(network, &[
            ("module", "proxy".into()),
            ("action", "eth_getTransactionByHash".into()),
            ("txhash", hash.into()),
        ])
        .await
    }

    pub async fn get_block(&self, network: Network, number_hex: &str) -> Result<Option<Block>, SourceError> {
        self.call(network, &[
            ("module", "proxy".into()),
            ("action", "eth_getBlockByNumber".into()),
            ("tag", number_hex.into()),
            ("boolean", "false".into()),
        ])
        .await
    }

    /// Balance plus best-effort activity for an address
    pub async fn account_snapshot(&self, network: Network, address: &str) -> Result<ChainRecord, SourceError> {
        let balance_raw = self.get_balance(network, address).await?;

        let tx_count = match self.get_transaction_count(network, address).await {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!("{} nonce lookup failed for {}: {}", PROVIDER, address, e);
                None
            }
        };

        let recent = match self
            .get_recent_transactions(network, address)
            .await
            .and_then(|txs| normalize_recent(&txs))
        {
            Ok(txs) => Some(txs),
            Err(e) => {
                tracing::warn!("{} txlist lookup failed for {}: {}", PROVIDER, address, e);
                None
            }
        };

        normalize_account(network, address, balance_raw, tx_count, recent)
    }

    /// Locate a transaction on the first network that knows its receipt
    pub async fn transaction_details(&self, networks: &[Network], hash: &str) -> Result<ChainRecord, SourceError> {
        let mut last_error = None;

        for &network in networks {
            let receipt = match self.get_receipt(network, hash).await {
                Ok(Some(receipt)) if receipt.block_number.is_some() => receipt,
                Ok(_) => {
                    tracing::debug!("{} has no receipt for {} on {}", PROVIDER, hash, network);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("{} receipt lookup failed on {}: {}", PROVIDER, network, e);
                    last_error = Some(e);
                    continue;
                }
            };

            let tx = self.get_transaction(network, hash).await.unwrap_or_else(|e| {
                tracing::warn!("{} transaction lookup failed on {}: {}", PROVIDER, network, e);
                None
            });

            let block = match receipt.block_number.as_deref() {
                Some(number) => self.get_block(network, number).await.unwrap_or_else(|e| {
                    tracing::warn!("{} block lookup failed on {}: {}", PROVIDER, network, e);
                    None
                }),
                None => None,
            };

            return normalize_transaction(network, hash, &receipt, tx.as_ref(), block.as_ref());
        }

        Err(last_error.unwrap_or_else(|| {
            SourceError::NotFound(format!(
                "transaction {} not found on {}",
                hash,
                networks.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(", ")
            ))
        }))
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        network: Network,
        params: &[(&str, String)],
    ) -> Result<Option<T>, SourceError> {
        let chain_id = chain_id(network).ok_or_else(|| {
            SourceError::Rejected(format!("{} does not serve {}", PROVIDER, network))
        })?;

        let mut query: Vec<(&str, String)> = Vec::with_capacity(params.len() + 2);
        query.push(("chainid", chain_id.to_string()));
        query.extend(params.iter().cloned());
        query.push(("apikey", self.config.api_key.clone()));

        tracing::debug!(
            "{} {} {}",
            PROVIDER,
            network,
            params.iter().map(|(k, v)| format!("{}={}", k, v)).collect::<Vec<_>>().join("&")
        );

        let envelope: Envelope = self.api.get_json(&self.config.api_url, &query, &[]).await?;
        envelope.into_result()
    }
}

#[async_trait]
impl ChainExplorer for EtherscanClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    async fn fetch(&self, id: &Identifier, networks: &[Network]) -> Result<ChainRecord, SourceError> {
        if id.is_address() {
            let network = networks.first().copied().unwrap_or(Network::Ethereum);
            self.account_snapshot(network, id.as_str()).await
        } else {
            self.transaction_details(networks, id.as_str()).await
        }
    }
}

/// Etherscan V2 chain id
pub fn chain_id(network: Network) -> Option<u64> {
    match network {
        Network::Ethereum => Some(1),
        Network::Polygon => Some(137),
        Network::Tron => None,
    }
}

fn wei_to_native(wei: u128) -> Result<Decimal, SourceError> {
    scale_units(wei, 18)
        .ok_or_else(|| SourceError::MalformedResponse(format!("amount {} wei out of range", wei)))
}

pub(crate) fn normalize_account(
    network: Network,
    address: &str,
    balance_raw: u128,
    tx_count: Option<u64>,
    recent: Option<Vec<RecentTransaction>>,
) -> Result<ChainRecord, SourceError> {
    Ok(ChainRecord {
        source: PROVIDER.to_string(),
        network,
        data: ChainData::Account(AccountSnapshot {
            address: address.to_string(),
            balance: wei_to_native(balance_raw)?,
            balance_raw,
            tx_count,
            recent,
        }),
    })
}

pub(crate) fn normalize_recent(txs: &[AccountTx]) -> Result<Vec<RecentTransaction>, SourceError> {
    txs.iter()
        .map(|tx| {
            let wei: u128 = tx.value.parse().map_err(|_| {
                SourceError::MalformedResponse(format!("txlist value '{}' is not an integer", tx.value))
            })?;
            let timestamp = tx
                .time_stamp
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
            Ok(RecentTransaction {
                hash: tx.hash.to_lowercase(),
                from: tx.from.to_lowercase(),
                to: Some(tx.to.to_lowercase()).filter(|t| !t.is_empty()),
                value: wei_to_native(wei)?,
                timestamp,
                failed: tx.is_error == "1",
            })
        })
        .collect()
}

pub(crate) fn normalize_transaction(
    network: Network,
    hash: &str,
    receipt: &Receipt,
    tx: Option<&RpcTransaction>,
    block: Option<&Block>,
) -> Result<ChainRecord, SourceError> {
    let block_number = receipt.block_number.as_deref().map(parse_hex_u64).transpose()?;

    let status = match (receipt.status.as_deref(), block_number) {
        (_, None) => TxStatus::Pending,
        (Some("0x1"), _) => TxStatus::Success,
        (Some("0x0"), _) => TxStatus::Failed,
        _ => TxStatus::Unknown,
    };

    let gas_used = receipt.gas_used.as_deref().map(parse_hex_u64).transpose()?;
    let gas_price = match receipt.effective_gas_price.as_deref() {
        Some(p) => Some(parse_hex_u128(p)?),
        None => tx.and_then(|t| t.gas_price.as_deref()).map(parse_hex_u128).transpose()?,
    };
    let fee = match (gas_used, gas_price) {
        (Some(used), Some(price)) => (used as u128)
            .checked_mul(price)
            .map(wei_to_native)
            .transpose()?,
        _ => None,
    };

    let value = match tx.and_then(|t| t.value.as_deref()) {
        Some(v) => Some(wei_to_native(parse_hex_u128(v)?)?),
        None => None,
    };

    let timestamp = match block {
        Some(b) => {
            let secs = parse_hex_u64(&b.timestamp)?;
            i64::try_from(secs).ok().and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        }
        None => None,
    };

    let from = receipt
        .from
        .clone()
        .or_else(|| tx.and_then(|t| t.from.clone()))
        .map(|a| a.to_lowercase());
    let to = receipt
        .to
        .clone()
        .or_else(|| tx.and_then(|t| t.to.clone()))
        .map(|a| a.to_lowercase());

    Ok(ChainRecord {
        source: PROVIDER.to_string(),
        network,
        data: ChainData::Transaction(TransactionDetails {
            hash: hash.to_lowercase(),
            status,
            block: block_number,
            timestamp,
            from,
            to,
            value,
            fee,
            gas_used,
            transfers: decode_transfers(&receipt.logs),
        }),
    })
}

/// Decode ERC-20 `Transfer` events from receipt logs.
///
/// Events with a fourth topic are ERC-721 transfers and are skipped.
pub fn decode_transfers(logs: &[Log]) -> Vec<TokenTransfer> {
    logs.iter()
        .filter(|log| {
            log.topics.len() == 3
                && log.topics[0].eq_ignore_ascii_case(TRANSFER_TOPIC)
        })
        .filter_map(|log| {
            let from = topic_address(&log.topics[1])?;
            let to = topic_address(&log.topics[2])?;
            let raw_amount = match parse_hex_u128(&log.data) {
                Ok(v) => v.to_string(),
                // uint256 wider than u128: keep the hex form
                Err(_) => log.data.to_lowercase(),
            };
            Some(TokenTransfer {
                from,
                to,
                contract: log.address.to_lowercase(),
                raw_amount,
                symbol: None,
                decimals: None,
                amount: None,
            })
        })
        .collect()
}

/// Last 20 bytes of a 32-byte topic
fn topic_address(topic: &str) -> Option<String> {
    let hex = topic.strip_prefix("0x")?;
    let tail = hex.get(hex.len().checked_sub(40)?..)?;
    if !tail.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{}", tail.to_lowercase()))
}
