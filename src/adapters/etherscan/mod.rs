//! Etherscan Adapter
//!
//! Chain explorer for Ethereum and Polygon via the Etherscan V2 multichain API.
//! Requires an API key; without one the adapter is not constructed.

mod client;
mod types;

pub use client::{chain_id, decode_transfers, EtherscanClient, EtherscanConfig, TRANSFER_TOPIC};
pub use types::{AccountTx, Block, Envelope, Log, Receipt, RpcTransaction};
