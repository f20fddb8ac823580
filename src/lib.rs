//! Chain Investigator Library
//!
//! Turns a wallet address or transaction hash into a report built from
//! public block explorers and a price aggregator.
//!
//! # Modules
//!
//! - `domain`: Identifiers, normalized records, the report and risk scoring
//! - `ports`: Trait abstractions (ChainExplorer, PriceFeed)
//! - `adapters`: External implementations (Etherscan, TronScan, CoinGecko, CLI, web)
//! - `application`: Report assembly and the investigation pipeline
//! - `render`: DOCX, PDF and CSV output
//! - `config`: Configuration loading and validation

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod application;
pub mod render;
pub mod config;
