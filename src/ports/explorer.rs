//! Chain Explorer Port
//!
//! An explorer turns a validated identifier into a `ChainRecord`.

use async_trait::async_trait;

use super::error::SourceError;
use crate::domain::{ChainFamily, ChainRecord, Identifier, Network};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainExplorer: Send + Sync {
    /// Provider name shown in the data source table
    fn name(&self) -> &'static str;

    /// Chain family this explorer can answer for
    fn family(&self) -> ChainFamily;

    /// Fetch the record for `id`, trying `networks` in order
    async fn fetch(&self, id: &Identifier, networks: &[Network]) -> Result<ChainRecord, SourceError>;
}
