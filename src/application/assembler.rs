//! Report Assembler
//!
//! Pure merge of adapter outcomes into an immutable `Report`. Each source
//! owns disjoint fields; a missing input makes the dependent derived fields
//! `Unavailable` instead of zero.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::domain::{
    assess, ChainData, ChainRecord, Derived, FiatValue, Flow, Identifier, LabelSet, MarketRecord,
    Network, Report, ReportSummary, SourceRole, SourceState, SourceStatus,
};
use crate::ports::SourceError;

/// Max counterparties kept on a report
pub const MAX_COUNTERPARTIES: usize = 50;

/// How one adapter call ended
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fetched(T),
    Failed(SourceError),
    /// Not attempted (disabled adapter, unsupported network)
    Skipped(String),
}

/// An adapter's name, role and result
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome<T> {
    pub source: String,
    pub role: SourceRole,
    pub outcome: Outcome<T>,
}

impl<T> SourceOutcome<T> {
    pub fn fetched(source: impl Into<String>, role: SourceRole, value: T) -> Self {
        Self { source: source.into(), role, outcome: Outcome::Fetched(value) }
    }

    pub fn failed(source: impl Into<String>, role: SourceRole, err: SourceError) -> Self {
        Self { source: source.into(), role, outcome: Outcome::Failed(err) }
    }

    pub fn skipped(source: impl Into<String>, role: SourceRole, reason: impl Into<String>) -> Self {
        Self { source: source.into(), role, outcome: Outcome::Skipped(reason.into()) }
    }

    fn status(&self) -> SourceStatus {
        let state = match &self.outcome {
            Outcome::Fetched(_) => SourceState::Available,
            Outcome::Failed(err) => SourceState::Unavailable(err.to_string()),
            Outcome::Skipped(reason) => SourceState::Skipped(reason.clone()),
        };
        SourceStatus {
            source: self.source.clone(),
            role: self.role,
            state,
        }
    }

    fn value(&self) -> Option<&T> {
        match &self.outcome {
            Outcome::Fetched(v) => Some(v),
            _ => None,
        }
    }

    /// Why no value is present, for `Derived::Unavailable`
    fn missing_reason(&self) -> String {
        match &self.outcome {
            Outcome::Fetched(_) => String::new(),
            Outcome::Failed(err) => format!("{} failed: {}", self.source, err),
            Outcome::Skipped(reason) => format!("{} skipped: {}", self.source, reason),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    labels: LabelSet,
}

impl ReportAssembler {
    pub fn new(labels: LabelSet) -> Self {
        Self { labels }
    }

    pub fn assemble(
        &self,
        identifier: Identifier,
        chain: SourceOutcome<ChainRecord>,
        market: SourceOutcome<MarketRecord>,
        generated_at: DateTime<Utc>,
    ) -> Report {
        let sources = vec![chain.status(), market.status()];
        let chain_record = chain.value().cloned();
        let market_record = market.value().cloned();

        let network = chain_record
            .as_ref()
            .map(|c| c.network)
            .or_else(|| identifier.network());

        let fiat_value = match &chain_record {
            None => Derived::Unavailable(format!("no on-chain data ({})", chain.missing_reason())),
            Some(record) => match record.native_amount() {
                None => Derived::Unavailable("native value not reported".to_string()),
                Some(amount) => value_at_price(amount, record.network, &market),
            },
        };

        let fee_fiat_value = if identifier.is_address() {
            Derived::Unavailable("not applicable to wallet addresses".to_string())
        } else {
            match &chain_record {
                None => Derived::Unavailable(format!("no on-chain data ({})", chain.missing_reason())),
                Some(record) => match record.transaction().and_then(|tx| tx.fee) {
                    None => Derived::Unavailable("fee not reported".to_string()),
                    Some(fee) => value_at_price(fee, record.network, &market),
                },
            }
        };

        let all_counterparties = chain_record
            .as_ref()
            .map(|c| counterparties(identifier.as_str(), c))
            .unwrap_or_default();
        let flow = chain_record
            .as_ref()
            .and_then(|c| flow(identifier.as_str(), c));

        let summary = summarize(&chain_record, &market_record, network, all_counterparties.len());

        // Labels are matched against every peer; only the stored list is capped
        let risk = chain_record
            .as_ref()
            .map(|c| assess(identifier.as_str(), c, flow, &all_counterparties, &self.labels));

        let counterparties: Vec<String> = all_counterparties
            .into_iter()
            .take(MAX_COUNTERPARTIES)
            .collect();

        let mut summary = summary;
        if let Some(risk) = &risk {
            summary.lines.push(format!("Risk: {}/100 ({})", risk.score, risk.band));
        }

        Report {
            identifier,
            generated_at,
            network,
            chain: chain_record,
            market: market_record,
            sources,
            fiat_value,
            fee_fiat_value,
            counterparties,
            flow,
            summary,
            risk,
        }
    }
}

fn value_at_price(
    amount: rust_decimal::Decimal,
    network: Network,
    market: &SourceOutcome<MarketRecord>,
) -> Derived<FiatValue> {
    let record = match market.value() {
        Some(record) => record,
        None => {
            return Derived::Unavailable(format!("no price data ({})", market.missing_reason()))
        }
    };
    match record.price(network) {
        Some(price) => match amount.checked_mul(price) {
            Some(value) => Derived::Available(FiatValue {
                amount: value,
                currency: record.currency.clone(),
                unit_price: price,
            }),
            None => Derived::Unavailable("value out of range".to_string()),
        },
        None => Derived::Unavailable(format!(
            "{} has no {} price for {}",
            record.source,
            record.currency.to_uppercase(),
            network.native_symbol()
        )),
    }
}

/// Distinct peers of the subject, sorted
fn counterparties(subject: &str, chain: &ChainRecord) -> Vec<String> {
    let mut peers = BTreeSet::new();
    let mut add = |addr: &str| {
        let addr = addr.trim();
        if !addr.is_empty() && !addr.eq_ignore_ascii_case(subject) {
            peers.insert(addr.to_string());
        }
    };

    match &chain.data {
        ChainData::Account(acc) => {
            for tx in acc.recent.iter().flatten() {
                add(&tx.from);
                if let Some(to) = &tx.to {
                    add(to);
                }
            }
        }
        ChainData::Transaction(tx) => {
            if let Some(from) = &tx.from {
                add(from);
            }
            if let Some(to) = &tx.to {
                add(to);
            }
            for t in &tx.transfers {
                add(&t.from);
                add(&t.to);
            }
        }
    }

    peers.into_iter().collect()
}

/// Direction of recent activity, accounts only
fn flow(subject: &str, chain: &ChainRecord) -> Option<Flow> {
    let recent = chain.account()?.recent.as_ref()?;
    if recent.is_empty() {
        return None;
    }
    let sent = recent.iter().filter(|t| t.from.eq_ignore_ascii_case(subject)).count();
    let received = recent
        .iter()
        .filter(|t| t.to.as_deref().map(|to| to.eq_ignore_ascii_case(subject)).unwrap_or(false))
        .count();

    Some(if sent > received {
        Flow::Outgoing
    } else if received > sent {
        Flow::Incoming
    } else {
        Flow::Balanced
    })
}

fn summarize(
    chain: &Option<ChainRecord>,
    market: &Option<MarketRecord>,
    network: Option<Network>,
    counterparty_count: usize,
) -> ReportSummary {
    let mut summary = ReportSummary {
        counterparty_count,
        ..Default::default()
    };

    match chain {
        Some(record) => {
            let net = record.network.as_str().to_uppercase();
            match &record.data {
                ChainData::Transaction(tx) => {
                    summary.transfer_count = tx.transfers.len();
                    let block = tx.block.map(|b| b.to_string()).unwrap_or_else(|| "N/A".to_string());
                    summary.lines.push(format!(
                        "Transaction on {} | status={} | block={}",
                        net,
                        tx.status.as_str(),
                        block
                    ));
                    if !tx.transfers.is_empty() {
                        summary.lines.push(format!("Token transfers: {}", tx.transfers.len()));
                    }
                }
                ChainData::Account(acc) => {
                    summary.recent_tx_count = acc.recent.as_ref().map(Vec::len).unwrap_or(0);
                    summary.lines.push(format!(
                        "{} balance retrieved: {} {}",
                        net,
                        acc.balance.normalize(),
                        record.network.native_symbol()
                    ));
                    if counterparty_count > 0 {
                        summary.lines.push(format!("Recent counterparties detected: {}", counterparty_count));
                    }
                }
            }
        }
        None => summary.lines.push("No on-chain data retrieved.".to_string()),
    }

    if let (Some(market), Some(network)) = (market, network) {
        if let Some(price) = market.price(network) {
            summary.lines.push(format!(
                "{} spot price: {} {}",
                network.native_symbol(),
                price.normalize(),
                market.currency.to_uppercase()
            ));
        }
    }

    summary
}
