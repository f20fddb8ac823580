//! Canned port implementations
//!
//! Record every call and answer with a preconfigured response. Used by the
//! pipeline tests and handy for offline demos.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::error::SourceError;
use super::explorer::ChainExplorer;
use super::price::PriceFeed;
use crate::domain::{ChainFamily, ChainRecord, Identifier, MarketRecord, Network};

/// Explorer that returns a fixed record or error
#[derive(Debug, Clone)]
pub struct StubExplorer {
    name: &'static str,
    family: ChainFamily,
    response: Result<ChainRecord, SourceError>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubExplorer {
    pub fn new(family: ChainFamily, response: Result<ChainRecord, SourceError>) -> Self {
        Self {
            name: "stub-explorer",
            family,
            response,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builder method to override the provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Identifiers this explorer was asked about
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Shared handle to the call log, usable after the stub is moved into an `Arc<dyn ChainExplorer>`
    pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ChainExplorer for StubExplorer {
    fn name(&self) -> &'static str {
        self.name
    }

    fn family(&self) -> ChainFamily {
        self.family
    }

    async fn fetch(&self, id: &Identifier, _networks: &[Network]) -> Result<ChainRecord, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(id.as_str().to_string());
        }
        self.response.clone()
    }
}

/// Price feed that returns a fixed record or error
#[derive(Debug, Clone)]
pub struct StubPriceFeed {
    response: Result<MarketRecord, SourceError>,
    calls: Arc<Mutex<Vec<Vec<Network>>>>,
}

impl StubPriceFeed {
    pub fn new(response: Result<MarketRecord, SourceError>) -> Self {
        Self {
            response,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Network lists this feed was asked about
    pub fn calls(&self) -> Vec<Vec<Network>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_log(&self) -> Arc<Mutex<Vec<Vec<Network>>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PriceFeed for StubPriceFeed {
    fn name(&self) -> &'static str {
        "stub-prices"
    }

    async fn spot_prices(&self, networks: &[Network]) -> Result<MarketRecord, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(networks.to_vec());
        }
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountSnapshot, ChainData};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_stub_explorer_records_calls() {
        let record = ChainRecord {
            source: "stub-explorer".into(),
            network: Network::Ethereum,
            data: ChainData::Account(AccountSnapshot {
                address: "0xabc".into(),
                balance: dec!(1),
                balance_raw: 1,
                tx_count: None,
                recent: None,
            }),
        };
        let stub = StubExplorer::new(ChainFamily::Evm, Ok(record.clone()));
        let id = Identifier::detect("0xdac17f958d2ee523a2206206994597c13d831ec7").unwrap();

        let result = stub.fetch(&id, &[Network::Ethereum]).await;
        assert_eq!(result, Ok(record));
        assert_eq!(stub.calls(), vec![id.as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_stub_price_feed_error() {
        let stub = StubPriceFeed::new(Err(SourceError::RateLimited { provider: "x".into() }));
        let result = stub.spot_prices(&[Network::Tron]).await;
        assert!(result.is_err());
        assert_eq!(stub.calls(), vec![vec![Network::Tron]]);

        let ok = StubPriceFeed::new(Ok(MarketRecord {
            source: "stub-prices".into(),
            currency: "usd".into(),
            quotes: BTreeMap::from([(Network::Tron, dec!(0.12))]),
            fetched_at: Utc::now(),
        }));
        assert!(ok.spot_prices(&[Network::Tron]).await.is_ok());
    }
}
