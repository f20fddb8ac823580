//! Identifier Parsing
//!
//! Classifies user input as a wallet address or a transaction hash and
//! fixes the chain family it belongs to. Validation happens before any
//! adapter is touched, so a malformed identifier never costs a request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest input accepted from any front-end
pub const MAX_INPUT_LEN: usize = 120;

const EVM_ADDRESS_HEX_LEN: usize = 40;
const TX_HASH_HEX_LEN: usize = 64;
const TRON_ADDRESS_LEN: usize = 34;
const TRON_ADDRESS_BYTES: usize = 25;
const TRON_ADDRESS_PREFIX: u8 = 0x41;

/// Identifier validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier is empty: paste a wallet address or a transaction hash")]
    Empty,

    #[error("Identifier is too long ({0} chars, max {max})", max = MAX_INPUT_LEN)]
    TooLong(usize),

    #[error("Unrecognized identifier format: {0}")]
    Unrecognized(String),

    #[error("Expected a {expected} but got a {found}")]
    KindMismatch {
        expected: IdentifierKind,
        found: IdentifierKind,
    },

    #[error("Identifier {value} is not valid on {network}")]
    NetworkMismatch { value: String, network: Network },
}

/// What the identifier points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Address,
    Transaction,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Address => write!(f, "wallet address"),
            IdentifierKind::Transaction => write!(f, "transaction hash"),
        }
    }
}

/// Chain family, fixed by the identifier's format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Tron,
}

/// Networks the adapters know how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    Polygon,
    Tron,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Ethereum, Network::Polygon, Network::Tron];

    pub fn family(&self) -> ChainFamily {
        match self {
            Network::Ethereum | Network::Polygon => ChainFamily::Evm,
            Network::Tron => ChainFamily::Tron,
        }
    }

    /// Ticker of the network's native asset
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETH",
            Network::Polygon => "POL",
            Network::Tron => "TRX",
        }
    }

    /// Decimal places of the native asset's smallest unit (wei, SUN)
    pub fn native_decimals(&self) -> u32 {
        match self {
            Network::Ethereum | Network::Polygon => 18,
            Network::Tron => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Polygon => "polygon",
            Network::Tron => "tron",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eth" | "ethereum" => Ok(Network::Ethereum),
            "polygon" | "matic" | "pol" => Ok(Network::Polygon),
            "tron" | "trx" | "trc" => Ok(Network::Tron),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

/// Kind constraint supplied by a front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindHint {
    #[default]
    Auto,
    Address,
    Transaction,
}

impl FromStr for KindHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(KindHint::Auto),
            "address" | "wallet" => Ok(KindHint::Address),
            "tx" | "transaction" | "hash" => Ok(KindHint::Transaction),
            other => Err(format!("unknown identifier kind '{}'", other)),
        }
    }
}

/// Network constraint supplied by a front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkHint {
    #[default]
    Auto,
    Exact(Network),
}

impl FromStr for NetworkHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(NetworkHint::Auto),
            other => other.parse().map(NetworkHint::Exact),
        }
    }
}

/// A validated wallet address or transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier {
    value: String,
    kind: IdentifierKind,
    family: ChainFamily,
    network: Option<Network>,
}

impl Identifier {
    /// Validate raw input against the format rules and the front-end hints
    pub fn parse(input: &str, kind: KindHint, network: NetworkHint) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if trimmed.chars().count() > MAX_INPUT_LEN {
            return Err(IdentifierError::TooLong(trimmed.chars().count()));
        }

        let (value, detected, family) = classify(trimmed)
            .ok_or_else(|| IdentifierError::Unrecognized(trimmed.to_string()))?;

        let expected = match kind {
            KindHint::Auto => None,
            KindHint::Address => Some(IdentifierKind::Address),
            KindHint::Transaction => Some(IdentifierKind::Transaction),
        };
        if let Some(expected) = expected {
            if expected != detected {
                return Err(IdentifierError::KindMismatch {
                    expected,
                    found: detected,
                });
            }
        }

        let network = match network {
            NetworkHint::Auto => match family {
                ChainFamily::Tron => Some(Network::Tron),
                ChainFamily::Evm => None,
            },
            NetworkHint::Exact(net) => {
                if net.family() != family {
                    return Err(IdentifierError::NetworkMismatch { value, network: net });
                }
                Some(net)
            }
        };

        Ok(Self {
            value,
            kind: detected,
            family,
            network,
        })
    }

    /// Parse with no hints
    pub fn detect(input: &str) -> Result<Self, IdentifierError> {
        Self::parse(input, KindHint::Auto, NetworkHint::Auto)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn family(&self) -> ChainFamily {
        self.family
    }

    /// Network pinned by the input or a hint; `None` means "probe the EVM chains"
    pub fn network(&self) -> Option<Network> {
        self.network
    }

    pub fn is_address(&self) -> bool {
        self.kind == IdentifierKind::Address
    }

    pub fn is_transaction(&self) -> bool {
        self.kind == IdentifierKind::Transaction
    }

    /// Networks an adapter should try, in order
    pub fn candidate_networks(&self, evm_probe_order: &[Network]) -> Vec<Network> {
        if let Some(net) = self.network {
            return vec![net];
        }
        match (self.family, self.kind) {
            (ChainFamily::Tron, _) => vec![Network::Tron],
            // An address exists on every EVM chain; the first configured one answers
            (ChainFamily::Evm, IdentifierKind::Address) => evm_probe_order
                .iter()
                .copied()
                .filter(|n| n.family() == ChainFamily::Evm)
                .take(1)
                .collect(),
            (ChainFamily::Evm, IdentifierKind::Transaction) => evm_probe_order
                .iter()
                .copied()
                .filter(|n| n.family() == ChainFamily::Evm)
                .collect(),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn classify(input: &str) -> Option<(String, IdentifierKind, ChainFamily)> {
    if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        if !is_hex(hex) {
            return None;
        }
        let kind = match hex.len() {
            EVM_ADDRESS_HEX_LEN => IdentifierKind::Address,
            TX_HASH_HEX_LEN => IdentifierKind::Transaction,
            _ => return None,
        };
        return Some((format!("0x{}", hex.to_ascii_lowercase()), kind, ChainFamily::Evm));
    }

    if input.len() == TX_HASH_HEX_LEN && is_hex(input) {
        return Some((input.to_ascii_lowercase(), IdentifierKind::Transaction, ChainFamily::Tron));
    }

    if is_tron_address(input) {
        return Some((input.to_string(), IdentifierKind::Address, ChainFamily::Tron));
    }

    None
}

fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Base58 TRON address: 'T' + 33 chars, 25 decoded bytes, 0x41 version byte
pub fn is_tron_address(s: &str) -> bool {
    if s.len() != TRON_ADDRESS_LEN || !s.starts_with('T') {
        return false;
    }
    match bs58::decode(s).into_vec() {
        Ok(bytes) => bytes.len() == TRON_ADDRESS_BYTES && bytes[0] == TRON_ADDRESS_PREFIX,
        Err(_) => false,
    }
}
