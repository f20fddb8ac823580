//! CoinGecko Response Types

use serde::Deserialize;
use std::collections::HashMap;

/// `GET /simple/price?ids=a,b&vs_currencies=usd`
///
/// `{"ethereum": {"usd": 3000.5}, "tron": {"usd": 0.12}}`; unknown ids are
/// simply absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct SimplePrice(pub HashMap<String, HashMap<String, f64>>);

impl SimplePrice {
    pub fn quote(&self, asset_id: &str, currency: &str) -> Option<f64> {
        self.0.get(asset_id).and_then(|q| q.get(currency)).copied()
    }
}
