//! Domain Layer - Core types for chain investigations
//!
//! Pure types and logic with no I/O. Adapters produce normalized records,
//! the application layer merges them into a `Report`.
//!
//! - `identifier`: wallet address / transaction hash validation
//! - `record`: normalized per-source records
//! - `report`: the merged snapshot and derived fields
//! - `risk`: heuristic risk scoring over fetched data

pub mod identifier;
pub mod record;
pub mod report;
pub mod risk;

pub use identifier::{
    ChainFamily, Identifier, IdentifierError, IdentifierKind, KindHint, Network, NetworkHint,
    MAX_INPUT_LEN,
};
pub use record::{
    scale_units, AccountSnapshot, ChainData, ChainRecord, MarketRecord, RecentTransaction,
    TokenTransfer, TransactionDetails, TxStatus,
};
pub use report::{
    Derived, FiatValue, Flow, Report, ReportSummary, SourceRole, SourceState, SourceStatus,
};
pub use risk::{assess, LabelSet, RiskAssessment, RiskBand};
