//! CoinGecko Price Client
//!
//! Native asset spot prices for every candidate network in one request.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::types::SimplePrice;
use crate::adapters::http::{ApiClient, HttpSettings};
use crate::domain::{MarketRecord, Network};
use crate::ports::{PriceFeed, SourceError};

const PROVIDER: &str = "coingecko";

/// Configuration for the CoinGeckoClient
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub api_url: String,
    /// Demo API key, sent as `x-cg-demo-api-key`
    pub api_key: Option<String>,
    /// Lowercase fiat code
    pub currency: String,
    /// CoinGecko asset id of each network's native coin
    pub asset_ids: HashMap<Network, String>,
    pub http: HttpSettings,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3".to_string(),
            api_key: None,
            currency: "usd".to_string(),
            asset_ids: default_asset_ids(),
            http: HttpSettings::default(),
        }
    }
}

pub fn default_asset_ids() -> HashMap<Network, String> {
    HashMap::from([
        (Network::Ethereum, "ethereum".to_string()),
        (Network::Polygon, "matic-network".to_string()),
        (Network::Tron, "tron".to_string()),
    ])
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    config: CoinGeckoConfig,
    api: ApiClient,
}

impl CoinGeckoClient {
    pub fn new(config: CoinGeckoConfig) -> Result<Self, SourceError> {
        let api = ApiClient::new(PROVIDER, config.http.clone())?;
        Ok(Self { config, api })
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }

    pub async fn simple_price(&self, ids: &[&str]) -> Result<SimplePrice, SourceError> {
        let url = format!("{}/simple/price", self.config.api_url.trim_end_matches('/'));
        let query = [
            ("ids", ids.join(",")),
            ("vs_currencies", self.config.currency.clone()),
        ];
        let headers: Vec<(&'static str, String)> = match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => vec![("x-cg-demo-api-key", key.to_string())],
            _ => Vec::new(),
        };

        debug!("CoinGecko simple/price ids={}", query[0].1);
        self.api.get_json(&url, &query, &headers).await
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn spot_prices(&self, networks: &[Network]) -> Result<MarketRecord, SourceError> {
        let wanted: Vec<(Network, &str)> = networks
            .iter()
            .filter_map(|n| self.config.asset_ids.get(n).map(|id| (*n, id.as_str())))
            .collect();

        if wanted.is_empty() {
            return Err(SourceError::Rejected(format!(
                "no {} asset id configured for {:?}",
                PROVIDER, networks
            )));
        }

        let ids: Vec<&str> = wanted.iter().map(|(_, id)| *id).collect();
        let prices = self.simple_price(&ids).await?;
        normalize_prices(&prices, &wanted, &self.config.currency)
    }
}

pub(crate) fn normalize_prices(
    prices: &SimplePrice,
    wanted: &[(Network, &str)],
    currency: &str,
) -> Result<MarketRecord, SourceError> {
    let mut quotes = BTreeMap::new();
    for (network, id) in wanted {
        if let Some(price) = prices.quote(id, currency) {
            let price = Decimal::try_from(price).map_err(|_| {
                SourceError::MalformedResponse(format!("{} price {} for {} is not finite", PROVIDER, price, id))
            })?;
            quotes.insert(*network, price);
        }
    }

    if quotes.is_empty() {
        return Err(SourceError::MalformedResponse(format!(
            "{} returned no {} quote for any of the requested assets",
            PROVIDER, currency
        )));
    }

    Ok(MarketRecord {
        source: PROVIDER.to_string(),
        currency: currency.to_string(),
        quotes,
        fetched_at: Utc::now(),
    })
}
