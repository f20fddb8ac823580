//! CoinGecko Adapter
//!
//! Price aggregator for native asset spot prices (ETH, POL, TRX).

mod client;
mod types;

pub use client::{default_asset_ids, CoinGeckoClient, CoinGeckoConfig};
pub use types::SimplePrice;
