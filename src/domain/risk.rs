//! Risk Assessment
//!
//! Heuristic 0-100 score over data already fetched for the report. No
//! network calls: label lists come from configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use super::identifier::Network;
use super::record::{ChainData, ChainRecord, TxStatus};
use super::report::Flow;

const SCORE_INACTIVE: u8 = 20;
const SCORE_LOW_TRX: u8 = 10;
const SCORE_OUTGOING_FLOW: u8 = 5;
const SCORE_FAILED_TX: u8 = 10;
const SCORE_NO_STABLECOIN: u8 = 10;
const SCORE_FLAGGED: u8 = 25;
const MAX_SCORE: u8 = 100;

/// TRON accounts below this are treated as throwaway
const MIN_ACTIVE_TRX: Decimal = dec!(500);

/// Risk band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            RiskBand::High
        } else if score >= 40 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBand::Low => write!(f, "LOW"),
            RiskBand::Medium => write!(f, "MEDIUM"),
            RiskBand::High => write!(f, "HIGH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub band: RiskBand,
    pub reasons: Vec<String>,
}

/// Known address lists, lowercase
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    stable_contracts: HashSet<String>,
    flagged: HashSet<String>,
}

impl LabelSet {
    pub fn new<S, F>(stable_contracts: S, flagged: F) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        F: IntoIterator,
        F::Item: AsRef<str>,
    {
        Self {
            stable_contracts: normalize(stable_contracts),
            flagged: normalize(flagged),
        }
    }

    pub fn is_stable_contract(&self, address: &str) -> bool {
        self.stable_contracts.contains(&address.trim().to_lowercase())
    }

    pub fn is_flagged(&self, address: &str) -> bool {
        self.flagged.contains(&address.trim().to_lowercase())
    }
}

fn normalize<I>(items: I) -> HashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Score a chain record
pub fn assess(
    subject: &str,
    chain: &ChainRecord,
    flow: Option<Flow>,
    counterparties: &[String],
    labels: &LabelSet,
) -> RiskAssessment {
    let mut score: u16 = 0;
    let mut reasons = Vec::new();

    match &chain.data {
        ChainData::Account(acc) => {
            let no_activity = acc.tx_count == Some(0)
                && acc.recent.as_ref().map(|r| r.is_empty()).unwrap_or(true);
            if no_activity {
                score += SCORE_INACTIVE as u16;
                reasons.push("Account has no recorded transactions (inactive).".to_string());
            } else if let Some(count) = acc.tx_count {
                reasons.push(format!("{} transactions recorded on {}.", count, chain.network));
            }

            if chain.network == Network::Tron {
                if acc.balance > MIN_ACTIVE_TRX {
                    reasons.push(format!("Balance above {} TRX (active account).", MIN_ACTIVE_TRX));
                } else {
                    score += SCORE_LOW_TRX as u16;
                    reasons.push(format!("Low TRX balance (<= {}).", MIN_ACTIVE_TRX));
                }
            }
        }
        ChainData::Transaction(tx) => {
            if tx.status == TxStatus::Failed {
                score += SCORE_FAILED_TX as u16;
                reasons.push("Transaction failed or was reverted.".to_string());
            }

            if !tx.transfers.is_empty() {
                let stable = tx
                    .transfers
                    .iter()
                    .filter(|t| labels.is_stable_contract(&t.contract))
                    .count();
                if stable > 0 {
                    reasons.push(format!("{} stablecoin transfer(s) (lower volatility).", stable));
                } else {
                    score += SCORE_NO_STABLECOIN as u16;
                    reasons.push("No stablecoin transfers detected (higher volatility).".to_string());
                }
            }
        }
    }

    if flow == Some(Flow::Outgoing) {
        score += SCORE_OUTGOING_FLOW as u16;
        reasons.push("Outgoing flow dominates (possible draining of funds).".to_string());
    }

    let flagged: Vec<&str> = std::iter::once(subject)
        .chain(counterparties.iter().map(String::as_str))
        .filter(|a| labels.is_flagged(a))
        .collect();
    if !flagged.is_empty() {
        score += SCORE_FLAGGED as u16;
        reasons.push(format!(
            "Matches a flagged address list: {}.",
            flagged.join(", ")
        ));
    }

    let score = score.min(MAX_SCORE as u16) as u8;
    RiskAssessment {
        score,
        band: RiskBand::from_score(score),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{AccountSnapshot, TokenTransfer, TransactionDetails};
    use rust_decimal_macros::dec;

    const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

    fn labels() -> LabelSet {
        LabelSet::new([USDT], ["0xbad0000000000000000000000000000000000bad"])
    }

    fn transfer(contract: &str) -> TokenTransfer {
        TokenTransfer {
            from: "0x1".into(),
            to: "0x2".into(),
            contract: contract.into(),
            raw_amount: "1000000".into(),
            symbol: None,
            decimals: None,
            amount: None,
        }
    }

    fn tx_record(status: TxStatus, transfers: Vec<TokenTransfer>) -> ChainRecord {
        ChainRecord {
            source: "etherscan".into(),
            network: Network::Ethereum,
            data: ChainData::Transaction(TransactionDetails {
                hash: "0xhash".into(),
                status,
                block: Some(1),
                timestamp: None,
                from: None,
                to: None,
                value: None,
                fee: None,
                gas_used: None,
                transfers,
            }),
        }
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(RiskBand::from_score(0), RiskBand::Low);
        assert_eq!(RiskBand::from_score(39), RiskBand::Low);
        assert_eq!(RiskBand::from_score(40), RiskBand::Medium);
        assert_eq!(RiskBand::from_score(70), RiskBand::High);
    }

    #[test]
    fn test_failed_tx_without_stablecoins() {
        let record = tx_record(TxStatus::Failed, vec![transfer("0xother")]);
        let risk = assess("0xhash", &record, None, &[], &labels());
        assert_eq!(risk.score, SCORE_FAILED_TX + SCORE_NO_STABLECOIN);
        assert_eq!(risk.band, RiskBand::Low);
        assert_eq!(risk.reasons.len(), 2);
    }

    #[test]
    fn test_stablecoin_transfer_is_noted_not_scored() {
        let record = tx_record(TxStatus::Success, vec![transfer(&USDT.to_uppercase())]);
        let risk = assess("0xhash", &record, None, &[], &labels());
        assert_eq!(risk.score, 0);
        assert!(risk.reasons[0].contains("stablecoin"));
    }

    #[test]
    fn test_inactive_low_balance_tron_account_flagged_peer() {
        let record = ChainRecord {
            source: "tronscan".into(),
            network: Network::Tron,
            data: ChainData::Account(AccountSnapshot {
                address: "TAddr".into(),
                balance: dec!(12),
                balance_raw: 12_000_000,
                tx_count: Some(0),
                recent: None,
            }),
        };
        let peers = vec!["0xBAD0000000000000000000000000000000000BAD".to_string()];
        let risk = assess("TAddr", &record, Some(Flow::Outgoing), &peers, &labels());
        assert_eq!(
            risk.score,
            SCORE_INACTIVE + SCORE_LOW_TRX + SCORE_OUTGOING_FLOW + SCORE_FLAGGED
        );
        assert_eq!(risk.band, RiskBand::Medium);
    }

    #[test]
    fn test_label_normalization() {
        let set = LabelSet::new(["  \"0xAbC\" ", ""], Vec::<String>::new());
        assert!(set.is_stable_contract("0xabc"));
        assert!(!set.is_flagged("0xabc"));
    }
}
