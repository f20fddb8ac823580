//! Flat CSV export: one row per balance, transaction, fee, token transfer
//! or spot price found in the report.

use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;

use super::RenderError;
use crate::domain::{ChainData, Derived, Report};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow {
    pub record: &'static str,
    pub network: String,
    pub from: String,
    pub to: String,
    pub asset: String,
    pub amount: String,
    pub fiat_value: String,
}

/// Rows in template order
pub fn rows(report: &Report) -> Vec<CsvRow> {
    let mut rows = Vec::new();
    let price = match (&report.market, report.network) {
        (Some(market), Some(network)) => market.price(network),
        _ => None,
    };
    let fiat = |amount: Decimal| -> String {
        price
            .and_then(|p| amount.checked_mul(p))
            .map(|v| v.round_dp(2).normalize().to_string())
            .unwrap_or_default()
    };
    let derived = |value: &Derived<crate::domain::FiatValue>| -> String {
        value
            .value()
            .map(|v| v.amount.round_dp(2).normalize().to_string())
            .unwrap_or_default()
    };

    if let Some(chain) = &report.chain {
        let network = chain.network.as_str().to_string();
        let symbol = chain.network.native_symbol().to_string();

        match &chain.data {
            ChainData::Account(acc) => {
                rows.push(CsvRow {
                    record: "balance",
                    network: network.clone(),
                    from: acc.address.clone(),
                    to: String::new(),
                    asset: symbol.clone(),
                    amount: acc.balance.normalize().to_string(),
                    fiat_value: derived(&report.fiat_value),
                });
                for tx in acc.recent.iter().flatten() {
                    rows.push(CsvRow {
                        record: "recent_transaction",
                        network: network.clone(),
                        from: tx.from.clone(),
                        to: tx.to.clone().unwrap_or_default(),
                        asset: symbol.clone(),
                        amount: tx.value.normalize().to_string(),
                        fiat_value: fiat(tx.value),
                    });
                }
            }
            ChainData::Transaction(tx) => {
                if let Some(value) = tx.value {
                    rows.push(CsvRow {
                        record: "transaction",
                        network: network.clone(),
                        from: tx.from.clone().unwrap_or_default(),
                        to: tx.to.clone().unwrap_or_default(),
                        asset: symbol.clone(),
                        amount: value.normalize().to_string(),
                        fiat_value: derived(&report.fiat_value),
                    });
                }
                if let Some(fee) = tx.fee {
                    rows.push(CsvRow {
                        record: "fee",
                        network: network.clone(),
                        from: tx.from.clone().unwrap_or_default(),
                        to: String::new(),
                        asset: symbol.clone(),
                        amount: fee.normalize().to_string(),
                        fiat_value: derived(&report.fee_fiat_value),
                    });
                }
                for t in &tx.transfers {
                    rows.push(CsvRow {
                        record: "token_transfer",
                        network: network.clone(),
                        from: t.from.clone(),
                        to: t.to.clone(),
                        asset: t.symbol.clone().unwrap_or_else(|| t.contract.clone()),
                        amount: t
                            .amount
                            .map(|a| a.normalize().to_string())
                            .unwrap_or_else(|| t.raw_amount.clone()),
                        fiat_value: String::new(),
                    });
                }
            }
        }
    }

    if let Some(market) = &report.market {
        for (network, price) in &market.quotes {
            rows.push(CsvRow {
                record: "spot_price",
                network: network.as_str().to_string(),
                from: String::new(),
                to: String::new(),
                asset: network.native_symbol().to_string(),
                amount: "1".to_string(),
                fiat_value: price.normalize().to_string(),
            });
        }
    }

    rows
}

/// Write the export atomically
pub fn write_csv(report: &Report, path: &Path) -> Result<(), RenderError> {
    let dir = path
        .parent()
        .ok_or_else(|| RenderError::Csv(format!("{} has no parent directory", path.display())))?;

    let tmp = tempfile::Builder::new()
        .prefix(".report_")
        .suffix(".csv.tmp")
        .tempfile_in(dir)?;

    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(tmp);
    for row in rows(report) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    let tmp = wtr
        .into_inner()
        .map_err(|e| RenderError::Csv(e.error().to_string()))?;
    tmp.persist(path).map_err(|e| RenderError::Io(e.error))?;
    Ok(())
}
