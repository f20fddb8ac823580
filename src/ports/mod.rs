//! Ports Layer - Trait definitions for external data sources
//!
//! Following hexagonal architecture, these traits abstract:
//! - Chain explorers (balances, transactions, token transfers)
//! - Price aggregators (spot prices of native assets)
//!
//! Adapters implement them; the application layer only sees the traits.

pub mod error;
pub mod explorer;
pub mod mocks;
pub mod price;

pub use error::SourceError;
pub use explorer::ChainExplorer;
pub use price::PriceFeed;
