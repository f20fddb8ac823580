//! Document Model
//!
//! A flat list of blocks produced from a `Report` by a fixed template.
//! Writers (docx, plain text) only lay the blocks out, so identical reports
//! always give identical documents. The footer holds the only timestamp.

use rust_decimal::Decimal;

use crate::domain::{
    ChainData, Derived, FiatValue, IdentifierKind, Network, Report, SourceState, TxStatus,
};

/// Max rows listed in the transfer and counterparty sections
pub const MAX_LISTED: usize = 50;

/// Marker for values that do not apply or were not reported
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    Heading(String),
    Field { label: String, value: String },
    Bullet(String),
    Paragraph(String),
    Footer(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentModel {
    pub blocks: Vec<Block>,
}

impl DocumentModel {
    /// Apply the report template
    pub fn build(report: &Report) -> Self {
        let mut doc = DocumentModel::default();
        doc.push(Block::Title("Investigation Report: Wallet / Transaction".to_string()));

        summary_section(&mut doc, report);
        chain_section(&mut doc, report);
        valuation_section(&mut doc, report);
        transfers_section(&mut doc, report);
        counterparties_section(&mut doc, report);
        interpretation_section(&mut doc, report);
        risk_section(&mut doc, report);
        sources_section(&mut doc, report);
        notes_section(&mut doc);

        doc.push(Block::Footer(format!(
            "Generated {} UTC",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        )));
        doc
    }

    /// Plain text layout, one block per line
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Title(t) => {
                    out.push_str(t);
                    out.push('\n');
                    out.push_str(&"=".repeat(t.chars().count()));
                }
                Block::Heading(h) => {
                    out.push('\n');
                    out.push_str(h);
                }
                Block::Field { label, value } => {
                    out.push_str(label);
                    out.push_str(": ");
                    out.push_str(value);
                }
                Block::Bullet(b) => {
                    out.push_str("  - ");
                    out.push_str(b);
                }
                Block::Paragraph(p) => out.push_str(p),
                Block::Footer(f) => {
                    out.push('\n');
                    out.push_str(f);
                }
            }
            out.push('\n');
        }
        out
    }

    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Heading(h) => Some(h.as_str()),
                _ => None,
            })
            .collect()
    }

    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn heading(&mut self, text: &str) {
        self.push(Block::Heading(text.to_string()));
    }

    fn field(&mut self, label: &str, value: impl Into<String>) {
        self.push(Block::Field {
            label: label.to_string(),
            value: value.into(),
        });
    }

    fn bullet(&mut self, text: impl Into<String>) {
        self.push(Block::Bullet(text.into()));
    }
}

fn or_na<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn native(amount: Decimal, network: Network) -> String {
    format!("{} {}", amount.normalize(), network.native_symbol())
}

fn derived(value: &Derived<FiatValue>) -> String {
    match value {
        Derived::Available(v) => v.to_string(),
        Derived::Unavailable(reason) => format!("Unavailable ({})", reason),
    }
}

/// Reason recorded for the first chain explorer that did not deliver
fn chain_unavailable_reason(report: &Report) -> String {
    report
        .unavailable_sources()
        .find(|s| s.role == crate::domain::SourceRole::ChainExplorer)
        .map(|s| match &s.state {
            SourceState::Unavailable(r) => format!("{}: {}", s.source, r),
            SourceState::Skipped(r) => format!("{} skipped: {}", s.source, r),
            SourceState::Available => s.source.clone(),
        })
        .unwrap_or_else(|| "no chain explorer configured for this network".to_string())
}

fn summary_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("1. Summary");
    doc.field("Identifier", report.identifier.as_str());
    let kind = match report.identifier.kind() {
        IdentifierKind::Address => "Wallet address",
        IdentifierKind::Transaction => "Transaction hash",
    };
    doc.field("Type", kind);
    doc.field("Network", or_na(report.network.map(|n| n.as_str().to_uppercase())));
    let risk = match &report.risk {
        Some(r) => format!("{}/100 ({})", r.score, r.band),
        None => "Not assessed".to_string(),
    };
    doc.field("Risk", risk);
    for line in &report.summary.lines {
        doc.bullet(line.clone());
    }
}

fn chain_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("2. On-chain data");
    let chain = match &report.chain {
        Some(chain) => chain,
        None => {
            doc.bullet(format!("Unavailable ({})", chain_unavailable_reason(report)));
            return;
        }
    };
    let network = chain.network;

    match &chain.data {
        ChainData::Account(acc) => {
            doc.field("Address", acc.address.clone());
            doc.field("Balance", native(acc.balance, network));
            doc.field("Transactions recorded", or_na(acc.tx_count));
            match &acc.recent {
                Some(recent) if recent.is_empty() => {
                    doc.field("Recent transactions", "none");
                }
                Some(recent) => {
                    doc.field("Recent transactions", recent.len().to_string());
                    for tx in recent.iter().take(MAX_LISTED) {
                        let when = tx
                            .timestamp
                            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
                        let failed = if tx.failed { " [failed]" } else { "" };
                        doc.bullet(format!(
                            "{} {} -> {}: {}{} ({})",
                            when,
                            tx.from,
                            or_na(tx.to.as_deref()),
                            native(tx.value, network),
                            failed,
                            tx.hash
                        ));
                    }
                }
                None => doc.field("Recent transactions", NOT_AVAILABLE),
            }
        }
        ChainData::Transaction(tx) => {
            doc.field("Hash", tx.hash.clone());
            let status = match tx.status {
                TxStatus::Success => "Success",
                TxStatus::Failed => "Failed",
                TxStatus::Pending => "Pending",
                TxStatus::Unknown => NOT_AVAILABLE,
            };
            doc.field("Status", status);
            doc.field("Block", or_na(tx.block));
            doc.field(
                "Timestamp (UTC)",
                or_na(tx.timestamp.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())),
            );
            doc.field("From", or_na(tx.from.as_deref()));
            doc.field("To", or_na(tx.to.as_deref()));
            doc.field("Value", or_na(tx.value.map(|v| native(v, network))));
            doc.field("Fee", or_na(tx.fee.map(|v| native(v, network))));
            if let Some(gas) = tx.gas_used {
                doc.field("Gas used", gas.to_string());
            }
        }
    }
}

fn valuation_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("3. Valuation");
    let price = match (&report.market, report.network) {
        (Some(market), Some(network)) => market.price(network).map(|p| {
            format!(
                "1 {} = {} {}",
                network.native_symbol(),
                p.normalize(),
                market.currency.to_uppercase()
            )
        }),
        _ => None,
    };
    doc.field("Spot price", or_na(price));
    doc.field("Fiat value", derived(&report.fiat_value));
    if report.identifier.is_transaction() {
        doc.field("Fee value", derived(&report.fee_fiat_value));
    }
}

fn transfers_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("4. Token transfers");
    let transfers = match report.chain.as_ref().and_then(|c| c.transaction()) {
        Some(tx) => &tx.transfers,
        None => {
            doc.bullet(NOT_AVAILABLE);
            return;
        }
    };
    if transfers.is_empty() {
        doc.bullet("No token transfers detected.");
        return;
    }
    for t in transfers.iter().take(MAX_LISTED) {
        let amount = match (&t.amount, &t.symbol) {
            (Some(amount), Some(symbol)) => format!("{} {}", amount.normalize(), symbol),
            (Some(amount), None) => amount.normalize().to_string(),
            (None, Some(symbol)) => format!("{} (raw) {}", t.raw_amount, symbol),
            (None, None) => format!("{} (raw)", t.raw_amount),
        };
        doc.bullet(format!("{} -> {}: {} [token {}]", t.from, t.to, amount, t.contract));
    }
    if transfers.len() > MAX_LISTED {
        doc.bullet(format!("... and {} more", transfers.len() - MAX_LISTED));
    }
}

fn counterparties_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("5. Counterparties");
    if report.chain.is_none() {
        doc.bullet(NOT_AVAILABLE);
        return;
    }
    if report.counterparties.is_empty() {
        doc.bullet("No counterparties observed.");
        return;
    }
    for addr in report.counterparties.iter().take(MAX_LISTED) {
        doc.bullet(addr.clone());
    }
}

fn interpretation_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("6. Technical interpretation");
    let mut notes = Vec::new();
    if let Some(flow) = report.flow {
        notes.push(format!("Detected flow: {}.", flow));
    }
    if let Some(network) = report.network {
        notes.push(format!("Analysis performed on {}.", network.as_str().to_uppercase()));
    }
    if let Some(tx) = report.chain.as_ref().and_then(|c| c.transaction()) {
        if tx.transfers.is_empty() {
            notes.push("No token transfers were detected in this snapshot.".to_string());
        }
        if tx.status == TxStatus::Pending {
            notes.push("Transaction not yet confirmed; figures may change.".to_string());
        }
    }
    if report.summary.counterparty_count > MAX_LISTED {
        notes.push(format!("Counterparty list truncated to {} entries.", MAX_LISTED));
    }
    if notes.is_empty() {
        notes.push("No additional technical observations in this snapshot.".to_string());
    }
    for note in notes {
        doc.bullet(note);
    }
}

fn risk_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("7. Risk assessment");
    match &report.risk {
        Some(risk) => {
            doc.field("Score", format!("{}/100", risk.score));
            doc.field("Band", risk.band.to_string());
            if risk.reasons.is_empty() {
                doc.bullet("No relevant signals under the current rules.");
            }
            for reason in &risk.reasons {
                doc.bullet(reason.clone());
            }
            doc.push(Block::Paragraph(format!(
                "Overall risk level: {}. The score combines configured address lists \
                 with on-chain heuristics (flow, activity, token usage).",
                risk.band
            )));
        }
        None => doc.bullet("Not assessed: no on-chain data was retrieved."),
    }
}

fn sources_section(doc: &mut DocumentModel, report: &Report) {
    doc.heading("8. Data sources");
    if report.sources.is_empty() {
        doc.bullet("No data sources were queried.");
    }
    for status in &report.sources {
        let state = match &status.state {
            SourceState::Available => "available".to_string(),
            SourceState::Unavailable(reason) => format!("unavailable: {}", reason),
            SourceState::Skipped(reason) => format!("skipped: {}", reason),
        };
        doc.bullet(format!("{} ({}): {}", status.source, status.role, state));
    }
}

fn notes_section(doc: &mut DocumentModel) {
    doc.heading("9. Notes");
    doc.bullet(format!(
        "{}: not reported by the source or not applicable to this input type.",
        NOT_AVAILABLE
    ));
    doc.bullet("Unavailable: a data source needed for this field failed or was skipped.");
    doc.bullet(
        "This report reflects data retrieved at query time. The risk rating may change \
         with new on-chain activity and does not constitute forensic evidence.",
    );
}
