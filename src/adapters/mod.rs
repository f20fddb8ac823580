//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits and the front-ends:
//! - Etherscan: EVM explorer (Ethereum, Polygon) via the V2 multichain API
//! - TronScan: TRON explorer
//! - CoinGecko: spot prices of native assets
//! - CLI: Command-line interface handlers
//! - Web: local HTML interface

pub mod http;
pub mod etherscan;
pub mod tronscan;
pub mod coingecko;
pub mod cli;
pub mod web;

pub use etherscan::{EtherscanClient, EtherscanConfig};
pub use tronscan::{TronscanClient, TronscanConfig};
pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use cli::CliApp;
