//! Report
//!
//! The immutable snapshot a renderer works from: the normalized records that
//! arrived, the status of every source that was asked, and derived fields.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use super::identifier::{Identifier, Network};
use super::record::{ChainRecord, MarketRecord};
use super::risk::RiskAssessment;

/// What a source was asked to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRole {
    ChainExplorer,
    PriceAggregator,
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRole::ChainExplorer => write!(f, "chain explorer"),
            SourceRole::PriceAggregator => write!(f, "price aggregator"),
        }
    }
}

/// How a source call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum SourceState {
    Available,
    Unavailable(String),
    Skipped(String),
}

impl fmt::Display for SourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceState::Available => write!(f, "available"),
            SourceState::Unavailable(reason) => write!(f, "data unavailable: {}", reason),
            SourceState::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// One row of the data source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceStatus {
    pub source: String,
    pub role: SourceRole,
    pub state: SourceState,
}

impl SourceStatus {
    pub fn is_available(&self) -> bool {
        matches!(self.state, SourceState::Available)
    }
}

/// A computed field that may be missing one of its inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum Derived<T> {
    Available(T),
    Unavailable(String),
}

impl<T> Derived<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Derived::Available(v) => Some(v),
            Derived::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Derived::Available(_))
    }
}

/// Fiat value of a native amount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiatValue {
    pub amount: Decimal,
    pub currency: String,
    /// Price per native unit used for the computation
    pub unit_price: Decimal,
}

impl fmt::Display for FiatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount.round_dp(2), self.currency.to_uppercase())
    }
}

/// Direction of recent account activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Outgoing,
    Incoming,
    Balanced,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flow::Outgoing => write!(f, "mostly outgoing"),
            Flow::Incoming => write!(f, "mostly incoming"),
            Flow::Balanced => write!(f, "balanced"),
        }
    }
}

/// Summary counts over the merged records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub transfer_count: usize,
    pub recent_tx_count: usize,
    pub counterparty_count: usize,
    /// Short human-readable findings
    pub lines: Vec<String>,
}

/// Merged, immutable snapshot of one investigation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub identifier: Identifier,
    pub generated_at: DateTime<Utc>,
    /// Network the data was found on, once resolved
    pub network: Option<Network>,
    pub chain: Option<ChainRecord>,
    pub market: Option<MarketRecord>,
    pub sources: Vec<SourceStatus>,
    pub fiat_value: Derived<FiatValue>,
    /// Only meaningful for transactions
    pub fee_fiat_value: Derived<FiatValue>,
    pub counterparties: Vec<String>,
    pub flow: Option<Flow>,
    pub summary: ReportSummary,
    pub risk: Option<RiskAssessment>,
}

impl Report {
    /// At least one source delivered non-empty data
    pub fn has_useful_data(&self) -> bool {
        self.chain.as_ref().map(|c| c.has_content()).unwrap_or(false)
            || self.market.as_ref().map(|m| m.has_content()).unwrap_or(false)
    }

    pub fn unavailable_sources(&self) -> impl Iterator<Item = &SourceStatus> {
        self.sources.iter().filter(|s| !s.is_available())
    }
}
