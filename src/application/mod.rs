//! Application Layer
//!
//! - `assembler`: merges source outcomes into a `Report`
//! - `investigator`: the validate → fetch → assemble → render pipeline

pub mod assembler;
pub mod investigator;

pub use assembler::{Outcome, ReportAssembler, SourceOutcome, MAX_COUNTERPARTIES};
pub use investigator::{AdapterInfo, Investigation, InvestigationError, Investigator};
