//! Investigator
//!
//! The request pipeline: validate the identifier, query the explorer and the
//! price feed concurrently, assemble the report, render the output files.
//! Validation happens before any adapter is touched.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use super::assembler::{ReportAssembler, SourceOutcome};
use crate::adapters::coingecko::CoinGeckoClient;
use crate::adapters::etherscan::EtherscanClient;
use crate::adapters::tronscan::TronscanClient;
use crate::config::Config;
use crate::domain::{
    ChainFamily, ChainRecord, Identifier, IdentifierError, KindHint, MarketRecord, Network,
    NetworkHint, Report, SourceRole,
};
use crate::ports::{ChainExplorer, PriceFeed, SourceError};
use crate::render::{RenderError, RenderOutcome, Renderer};

#[derive(Debug, Error)]
pub enum InvestigationError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),
    #[error("Failed to write report: {0}")]
    Render(#[from] RenderError),
    #[error("Failed to set up data source: {0}")]
    Setup(#[from] SourceError),
}

/// A finished investigation
#[derive(Debug)]
pub struct Investigation {
    pub report: Report,
    pub output: RenderOutcome,
}

/// An adapter left out of the pipeline, and why
#[derive(Debug, Clone)]
struct DisabledSource {
    name: &'static str,
    family: ChainFamily,
    reason: String,
}

/// Adapter line for `doctor`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub name: String,
    pub role: SourceRole,
    pub enabled: bool,
    pub note: String,
}

pub struct Investigator {
    explorers: Vec<Arc<dyn ChainExplorer>>,
    price_feed: Option<Arc<dyn PriceFeed>>,
    disabled: Vec<DisabledSource>,
    assembler: ReportAssembler,
    renderer: Renderer,
    evm_probe_order: Vec<Network>,
}

impl Investigator {
    pub fn new(assembler: ReportAssembler, renderer: Renderer) -> Self {
        Self {
            explorers: Vec::new(),
            price_feed: None,
            disabled: Vec::new(),
            assembler,
            renderer,
            evm_probe_order: vec![Network::Ethereum, Network::Polygon],
        }
    }

    /// Wire the real adapters from configuration
    pub fn from_config(config: &Config) -> Result<Self, InvestigationError> {
        let renderer = Renderer::new(config.output.get_dir(), config.converter.settings());
        let mut investigator = Self::new(ReportAssembler::new(config.labels.label_set()), renderer)
            .with_evm_probe_order(config.network.probe_order());

        investigator = match config.etherscan.client_config() {
            Some(cfg) => investigator.with_explorer(Arc::new(EtherscanClient::new(cfg)?)),
            None => {
                warn!("No Etherscan API key configured; EVM lookups disabled");
                investigator.with_disabled_explorer("etherscan", ChainFamily::Evm, "no API key configured")
            }
        };

        investigator = if config.network.enable_tron {
            investigator.with_explorer(Arc::new(TronscanClient::new(config.tronscan.client_config())?))
        } else {
            investigator.with_disabled_explorer("tronscan", ChainFamily::Tron, "disabled in configuration")
        };

        Ok(investigator.with_price_feed(Arc::new(CoinGeckoClient::new(config.prices.client_config())?)))
    }

    pub fn with_explorer(mut self, explorer: Arc<dyn ChainExplorer>) -> Self {
        self.explorers.push(explorer);
        self
    }

    pub fn with_disabled_explorer(
        mut self,
        name: &'static str,
        family: ChainFamily,
        reason: impl Into<String>,
    ) -> Self {
        self.disabled.push(DisabledSource {
            name,
            family,
            reason: reason.into(),
        });
        self
    }

    pub fn with_price_feed(mut self, feed: Arc<dyn PriceFeed>) -> Self {
        self.price_feed = Some(feed);
        self
    }

    pub fn with_evm_probe_order(mut self, order: Vec<Network>) -> Self {
        if !order.is_empty() {
            self.evm_probe_order = order;
        }
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Enabled and disabled adapters
    pub fn adapters(&self) -> Vec<AdapterInfo> {
        let mut out: Vec<AdapterInfo> = self
            .explorers
            .iter()
            .map(|e| AdapterInfo {
                name: e.name().to_string(),
                role: SourceRole::ChainExplorer,
                enabled: true,
                note: match e.family() {
                    ChainFamily::Evm => "EVM chains".to_string(),
                    ChainFamily::Tron => "TRON".to_string(),
                },
            })
            .collect();
        if let Some(feed) = &self.price_feed {
            out.push(AdapterInfo {
                name: feed.name().to_string(),
                role: SourceRole::PriceAggregator,
                enabled: true,
                note: "spot prices".to_string(),
            });
        }
        out.extend(self.disabled.iter().map(|d| AdapterInfo {
            name: d.name.to_string(),
            role: SourceRole::ChainExplorer,
            enabled: false,
            note: d.reason.clone(),
        }));
        out
    }

    /// Run the whole pipeline for raw user input
    pub async fn investigate(
        &self,
        input: &str,
        kind: KindHint,
        network: NetworkHint,
    ) -> Result<Investigation, InvestigationError> {
        let id = Identifier::parse(input, kind, network)?;
        let report = self.build_report(id).await;
        let started = Instant::now();
        let output = self.renderer.render(&report).await?;
        info!(
            "Rendered {} artifact(s) for {} in {}ms",
            output.artifacts.len(),
            report.identifier,
            started.elapsed().as_millis()
        );
        Ok(Investigation { report, output })
    }

    /// Query every source for a validated identifier and merge the results
    pub async fn build_report(&self, id: Identifier) -> Report {
        let started = Instant::now();
        let networks = id.candidate_networks(&self.evm_probe_order);
        info!("Investigating {} {} on {:?}", id.kind(), id, networks);

        let (chain, market) = tokio::join!(
            self.fetch_chain(&id, &networks),
            self.fetch_prices(&networks)
        );
        info!("Data sources answered in {}ms", started.elapsed().as_millis());

        self.assembler.assemble(id, chain, market, Utc::now())
    }

    async fn fetch_chain(&self, id: &Identifier, networks: &[Network]) -> SourceOutcome<ChainRecord> {
        let role = SourceRole::ChainExplorer;
        let explorer = match self.explorers.iter().find(|e| e.family() == id.family()) {
            Some(explorer) => explorer,
            None => {
                return match self.disabled.iter().find(|d| d.family == id.family()) {
                    Some(d) => SourceOutcome::skipped(d.name, role, d.reason.clone()),
                    None => SourceOutcome::skipped(
                        "chain explorer",
                        role,
                        format!("no explorer configured for {:?} identifiers", id.family()),
                    ),
                };
            }
        };

        let started = Instant::now();
        match explorer.fetch(id, networks).await {
            Ok(record) => {
                info!("{} answered in {}ms", explorer.name(), started.elapsed().as_millis());
                SourceOutcome::fetched(explorer.name(), role, record)
            }
            Err(e) => {
                warn!("{} unavailable: {}", explorer.name(), e);
                SourceOutcome::failed(explorer.name(), role, e)
            }
        }
    }

    async fn fetch_prices(&self, networks: &[Network]) -> SourceOutcome<MarketRecord> {
        let role = SourceRole::PriceAggregator;
        let feed = match &self.price_feed {
            Some(feed) => feed,
            None => return SourceOutcome::skipped("price aggregator", role, "no price feed configured"),
        };

        let started = Instant::now();
        match feed.spot_prices(networks).await {
            Ok(record) => {
                info!("{} answered in {}ms", feed.name(), started.elapsed().as_millis());
                SourceOutcome::fetched(feed.name(), role, record)
            }
            Err(e) => {
                warn!("{} unavailable: {}", feed.name(), e);
                SourceOutcome::failed(feed.name(), role, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountSnapshot, ChainData, SourceState};
    use crate::ports::explorer::MockChainExplorer;
    use crate::ports::mocks::StubPriceFeed;
    use crate::render::ConverterSettings;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    const ADDR: &str = "0x00000000219ab540356cbb839cbe05303d7705fa";

    fn renderer(dir: &std::path::Path) -> Renderer {
        Renderer::new(
            dir,
            ConverterSettings {
                enabled: false,
                ..Default::default()
            },
        )
    }

    fn prices() -> StubPriceFeed {
        StubPriceFeed::new(Ok(MarketRecord {
            source: "stub-prices".into(),
            currency: "usd".into(),
            quotes: BTreeMap::from([(Network::Ethereum, dec!(2000))]),
            fetched_at: Utc::now(),
        }))
    }

    fn account_record() -> ChainRecord {
        ChainRecord {
            source: "mock".into(),
            network: Network::Ethereum,
            data: ChainData::Account(AccountSnapshot {
                address: ADDR.into(),
                balance: dec!(1),
                balance_raw: 1_000_000_000_000_000_000,
                tx_count: Some(3),
                recent: None,
            }),
        }
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_reaches_explorer() {
        let dir = tempdir().unwrap();
        let mut explorer = MockChainExplorer::new();
        explorer.expect_family().return_const(ChainFamily::Evm);
        explorer.expect_name().return_const("mock");
        explorer.expect_fetch().times(0);

        let feed = prices();
        let price_calls = feed.call_log();
        let investigator = Investigator::new(ReportAssembler::default(), renderer(dir.path()))
            .with_explorer(Arc::new(explorer))
            .with_price_feed(Arc::new(feed));

        let result = investigator
            .investigate("0x1234", KindHint::Auto, NetworkHint::Auto)
            .await;
        assert!(matches!(result, Err(InvestigationError::InvalidIdentifier(_))));
        assert!(price_calls.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_dispatches_to_matching_family() {
        let dir = tempdir().unwrap();

        let mut evm = MockChainExplorer::new();
        evm.expect_family().return_const(ChainFamily::Evm);
        evm.expect_name().return_const("mock-evm");
        evm.expect_fetch()
            .times(1)
            .withf(|id, networks| id.as_str() == ADDR && networks.to_vec() == vec![Network::Ethereum])
            .returning(|_, _| Ok(account_record()));

        let mut tron = MockChainExplorer::new();
        tron.expect_family().return_const(ChainFamily::Tron);
        tron.expect_name().return_const("mock-tron");
        tron.expect_fetch().times(0);

        let investigator = Investigator::new(ReportAssembler::default(), renderer(dir.path()))
            .with_explorer(Arc::new(tron))
            .with_explorer(Arc::new(evm))
            .with_price_feed(Arc::new(prices()));

        let done = investigator
            .investigate(ADDR, KindHint::Address, NetworkHint::Auto)
            .await
            .unwrap();
        assert_eq!(done.report.fiat_value.value().unwrap().amount, dec!(2000));
        assert_eq!(done.report.sources[0].source, "mock-evm");
    }

    #[tokio::test]
    async fn test_disabled_explorer_is_reported_as_skipped() {
        let dir = tempdir().unwrap();
        let investigator = Investigator::new(ReportAssembler::default(), renderer(dir.path()))
            .with_disabled_explorer("etherscan", ChainFamily::Evm, "no API key configured")
            .with_price_feed(Arc::new(prices()));

        let done = investigator
            .investigate(ADDR, KindHint::Auto, NetworkHint::Auto)
            .await
            .unwrap();
        assert_eq!(
            done.report.sources[0].state,
            SourceState::Skipped("no API key configured".into())
        );
        assert!(done.report.chain.is_none());
        assert!(done.output.artifacts.iter().any(|a| a.path.ends_with(format!("report_{}.docx", ADDR))));
    }

    #[test]
    fn test_adapters_listing() {
        let dir = tempdir().unwrap();
        let investigator = Investigator::new(ReportAssembler::default(), renderer(dir.path()))
            .with_disabled_explorer("etherscan", ChainFamily::Evm, "no API key configured")
            .with_price_feed(Arc::new(prices()));

        let adapters = investigator.adapters();
        assert_eq!(adapters.len(), 2);
        assert!(adapters.iter().any(|a| a.name == "stub-prices" && a.enabled));
        assert!(adapters.iter().any(|a| a.name == "etherscan" && !a.enabled));
    }

    #[test]
    fn test_setup_error_message() {
        let err = InvestigationError::from(SourceError::Network("tls backend unavailable".into()));
        assert!(matches!(err, InvestigationError::Setup(_)));
        assert_eq!(
            err.to_string(),
            "Failed to set up data source: Network error: tls backend unavailable"
        );
    }
}
