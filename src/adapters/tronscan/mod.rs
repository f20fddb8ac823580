//! TronScan Adapter
//!
//! Chain explorer for TRON accounts and transactions, including TRC-20
//! transfers reported by TronScan.

mod client;
mod types;

pub use client::{TronscanClient, TronscanConfig};
pub use types::{AccountInfo, Cost, TransactionInfo, Trc20Transfer};
