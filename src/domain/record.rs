//! Normalized Records
//!
//! The canonical shape of one data source's contribution to a report.
//! Adapters produce these; the assembler only reads them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use super::identifier::Network;

/// Outcome of a transaction as reported by the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
    Pending,
    Unknown,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
            TxStatus::Pending => "pending",
            TxStatus::Unknown => "unknown",
        }
    }
}

/// A token movement found inside a transaction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenTransfer {
    pub from: String,
    pub to: String,
    /// Token contract address
    pub contract: String,
    /// Amount in the token's base units, as a decimal string
    pub raw_amount: String,
    pub symbol: Option<String>,
    pub decimals: Option<u32>,
    /// Amount scaled by `decimals`, when the source reports decimals
    pub amount: Option<Decimal>,
}

/// Recent account activity entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentTransaction {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    /// Native amount moved
    pub value: Decimal,
    pub timestamp: Option<DateTime<Utc>>,
    pub failed: bool,
}

/// Balance and activity of an address
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub address: String,
    /// Native balance in whole units (ETH, POL, TRX)
    pub balance: Decimal,
    /// Native balance in the smallest unit (wei, SUN)
    pub balance_raw: u128,
    /// Confirmed transaction count (nonce on EVM, total count on TRON)
    pub tx_count: Option<u64>,
    /// Newest first; `None` when the source could not provide it
    pub recent: Option<Vec<RecentTransaction>>,
}

/// A single transaction and its decoded side effects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetails {
    pub hash: String,
    pub status: TxStatus,
    pub block: Option<u64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Native amount transferred, in whole units
    pub value: Option<Decimal>,
    /// Fee paid, in whole native units
    pub fee: Option<Decimal>,
    pub gas_used: Option<u64>,
    pub transfers: Vec<TokenTransfer>,
}

/// Chain-specific payload of an explorer record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChainData {
    Account(AccountSnapshot),
    Transaction(TransactionDetails),
}

/// Everything a chain explorer contributed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRecord {
    pub source: String,
    pub network: Network,
    pub data: ChainData,
}

impl ChainRecord {
    pub fn account(&self) -> Option<&AccountSnapshot> {
        match &self.data {
            ChainData::Account(acc) => Some(acc),
            ChainData::Transaction(_) => None,
        }
    }

    pub fn transaction(&self) -> Option<&TransactionDetails> {
        match &self.data {
            ChainData::Transaction(tx) => Some(tx),
            ChainData::Account(_) => None,
        }
    }

    /// Native amount the fiat valuation applies to
    pub fn native_amount(&self) -> Option<Decimal> {
        match &self.data {
            ChainData::Account(acc) => Some(acc.balance),
            ChainData::Transaction(tx) => tx.value,
        }
    }

    /// True when the record carries anything worth exporting
    pub fn has_content(&self) -> bool {
        match &self.data {
            ChainData::Account(_) => true,
            ChainData::Transaction(tx) => {
                tx.block.is_some() || tx.value.is_some() || !tx.transfers.is_empty()
            }
        }
    }
}

/// Spot prices from a price aggregator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketRecord {
    pub source: String,
    /// Fiat currency code, lowercase (e.g. "usd")
    pub currency: String,
    pub quotes: BTreeMap<Network, Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketRecord {
    pub fn price(&self, network: Network) -> Option<Decimal> {
        self.quotes.get(&network).copied()
    }

    pub fn has_content(&self) -> bool {
        !self.quotes.is_empty()
    }
}

/// Scale a smallest-unit integer into whole units (wei -> ETH, SUN -> TRX)
pub fn scale_units(raw: u128, decimals: u32) -> Option<Decimal> {
    let signed = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .ok()
        .map(|d| d.normalize())
}
