//! Price Feed Port

use async_trait::async_trait;

use super::error::SourceError;
use crate::domain::{MarketRecord, Network};

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Provider name shown in the data source table
    fn name(&self) -> &'static str;

    /// Spot prices of the native assets of `networks`, in one round trip
    async fn spot_prices(&self, networks: &[Network]) -> Result<MarketRecord, SourceError>;
}
