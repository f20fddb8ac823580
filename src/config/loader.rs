//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.
//! Every section is optional; secrets may come from the environment instead.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::adapters::coingecko::{default_asset_ids, CoinGeckoConfig};
use crate::adapters::etherscan::EtherscanConfig;
use crate::adapters::http::HttpSettings;
use crate::adapters::tronscan::TronscanConfig;
use crate::domain::{ChainFamily, LabelSet, Network};
use crate::render::ConverterSettings;

/// Path used when no `--config` is given
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub etherscan: EtherscanSection,
    #[serde(default)]
    pub tronscan: TronscanSection,
    #[serde(default)]
    pub prices: PricesSection,
    #[serde(default)]
    pub labels: LabelsSection,
    #[serde(default)]
    pub converter: ConverterSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Output files section
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    /// Directory reports are written to (`~` is expanded)
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

impl OutputSection {
    pub fn get_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.dir).to_string())
    }
}

/// Network selection section
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    /// EVM chains probed for transaction hashes, in order
    #[serde(default = "default_probe_order")]
    pub evm_probe_order: Vec<String>,
    /// Query TronScan for TRON identifiers
    #[serde(default = "default_true")]
    pub enable_tron: bool,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            evm_probe_order: default_probe_order(),
            enable_tron: true,
        }
    }
}

impl NetworkSection {
    /// Parsed probe order; unknown names are rejected by `Config::validate`
    pub fn probe_order(&self) -> Vec<Network> {
        self.evm_probe_order
            .iter()
            .filter_map(|n| n.parse::<Network>().ok())
            .collect()
    }
}

/// Etherscan V2 section
#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanSection {
    #[serde(default = "default_etherscan_url")]
    pub api_url: String,
    /// Required for EVM lookups; falls back to ETHERSCAN_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Number of recent transactions listed for an address
    #[serde(default = "default_recent_tx_limit")]
    pub recent_tx_limit: u32,
}

impl Default for EtherscanSection {
    fn default() -> Self {
        Self {
            api_url: default_etherscan_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_delay_ms(),
            recent_tx_limit: default_recent_tx_limit(),
        }
    }
}

impl EtherscanSection {
    /// Get API key with environment variable fallback
    /// Checks ETHERSCAN_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        key_or_env(&self.api_key, "ETHERSCAN_API_KEY")
    }

    /// Client configuration, or `None` when no API key is available
    pub fn client_config(&self) -> Option<EtherscanConfig> {
        let key = self.get_api_key()?;
        let mut config = EtherscanConfig::new(key).with_api_url(self.api_url.clone());
        config.http = http_settings(self.timeout_secs, self.max_retries, self.retry_base_delay_ms);
        config.recent_tx_limit = self.recent_tx_limit;
        Some(config)
    }
}

/// TronScan section
#[derive(Debug, Clone, Deserialize)]
pub struct TronscanSection {
    #[serde(default = "default_tronscan_url")]
    pub api_url: String,
    /// Optional; falls back to TRONSCAN_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for TronscanSection {
    fn default() -> Self {
        Self {
            api_url: default_tronscan_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl TronscanSection {
    pub fn get_api_key(&self) -> Option<String> {
        key_or_env(&self.api_key, "TRONSCAN_API_KEY")
    }

    pub fn client_config(&self) -> TronscanConfig {
        TronscanConfig {
            api_url: self.api_url.clone(),
            api_key: self.get_api_key(),
            http: http_settings(self.timeout_secs, self.max_retries, self.retry_base_delay_ms),
        }
    }
}

/// Price aggregator (CoinGecko) section
#[derive(Debug, Clone, Deserialize)]
pub struct PricesSection {
    #[serde(default = "default_coingecko_url")]
    pub api_url: String,
    /// Optional demo key; falls back to COINGECKO_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Fiat currency code (e.g. "usd", "eur")
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Network name -> CoinGecko asset id; merged over the built-in ids
    #[serde(default)]
    pub asset_ids: BTreeMap<String, String>,
}

impl Default for PricesSection {
    fn default() -> Self {
        Self {
            api_url: default_coingecko_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_delay_ms(),
            currency: default_currency(),
            asset_ids: BTreeMap::new(),
        }
    }
}

impl PricesSection {
    pub fn get_api_key(&self) -> Option<String> {
        key_or_env(&self.api_key, "COINGECKO_API_KEY")
    }

    pub fn asset_id_map(&self) -> HashMap<Network, String> {
        let mut ids = default_asset_ids();
        for (name, id) in &self.asset_ids {
            if let Ok(network) = name.parse::<Network>() {
                ids.insert(network, id.clone());
            }
        }
        ids
    }

    pub fn client_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            api_url: self.api_url.clone(),
            api_key: self.get_api_key(),
            currency: self.currency.trim().to_lowercase(),
            asset_ids: self.asset_id_map(),
            http: http_settings(self.timeout_secs, self.max_retries, self.retry_base_delay_ms),
        }
    }
}

/// Address label lists used by the risk assessment
#[derive(Debug, Clone, Deserialize)]
pub struct LabelsSection {
    /// Stablecoin token contracts (any supported chain)
    #[serde(default = "default_stable_contracts")]
    pub stable_contracts: Vec<String>,
    /// Addresses on scam, mixer or Ponzi lists
    #[serde(default)]
    pub flagged: Vec<String>,
}

impl Default for LabelsSection {
    fn default() -> Self {
        Self {
            stable_contracts: default_stable_contracts(),
            flagged: Vec::new(),
        }
    }
}

impl LabelsSection {
    pub fn label_set(&self) -> LabelSet {
        LabelSet::new(&self.stable_contracts, &self.flagged)
    }
}

/// External document converter section
#[derive(Debug, Clone, Deserialize)]
pub struct ConverterSection {
    /// Binary looked up on PATH (LibreOffice)
    #[serde(default = "default_converter_binary")]
    pub binary: String,
    #[serde(default = "default_converter_timeout")]
    pub timeout_secs: u64,
    /// Set false to never attempt PDF output
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ConverterSection {
    fn default() -> Self {
        Self {
            binary: default_converter_binary(),
            timeout_secs: default_converter_timeout(),
            enabled: true,
        }
    }
}

impl ConverterSection {
    pub fn settings(&self) -> ConverterSettings {
        ConverterSettings {
            binary: self.binary.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            enabled: self.enabled,
        }
    }
}

/// Local web interface section
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl ServerSection {
    /// Bind address with the port replaced by the PORT env var, if set
    pub fn get_bind(&self) -> String {
        match std::env::var("PORT") {
            Ok(port) if port.parse::<u16>().is_ok() => with_port(&self.bind, &port),
            _ => self.bind.clone(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load an explicit file, or the default path if it exists, or built-in defaults
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => load_config(DEFAULT_CONFIG_PATH),
        None => {
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.dir cannot be empty".to_string(),
            ));
        }

        if self.network.evm_probe_order.is_empty() {
            return Err(ConfigError::ValidationError(
                "network.evm_probe_order cannot be empty".to_string(),
            ));
        }
        for name in &self.network.evm_probe_order {
            match name.parse::<Network>() {
                Ok(network) if network.family() == ChainFamily::Evm => {}
                Ok(network) => {
                    return Err(ConfigError::ValidationError(format!(
                        "network.evm_probe_order: {} is not an EVM network",
                        network
                    )))
                }
                Err(e) => {
                    return Err(ConfigError::ValidationError(format!(
                        "network.evm_probe_order: {}",
                        e
                    )))
                }
            }
        }

        let apis = [
            ("etherscan", &self.etherscan.api_url, self.etherscan.timeout_secs, self.etherscan.max_retries),
            ("tronscan", &self.tronscan.api_url, self.tronscan.timeout_secs, self.tronscan.max_retries),
            ("prices", &self.prices.api_url, self.prices.timeout_secs, self.prices.max_retries),
        ];
        for (section, url, timeout, retries) in apis {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{}.api_url cannot be empty",
                    section
                )));
            }
            if timeout == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{}.timeout_secs must be > 0",
                    section
                )));
            }
            if retries == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "{}.max_retries must be > 0",
                    section
                )));
            }
        }

        if self.etherscan.recent_tx_limit == 0 {
            return Err(ConfigError::ValidationError(
                "etherscan.recent_tx_limit must be > 0".to_string(),
            ));
        }

        if self.prices.currency.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prices.currency cannot be empty".to_string(),
            ));
        }
        for name in self.prices.asset_ids.keys() {
            if let Err(e) = name.parse::<Network>() {
                return Err(ConfigError::ValidationError(format!(
                    "prices.asset_ids: {}",
                    e
                )));
            }
        }

        if self.converter.enabled {
            if self.converter.binary.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "converter.binary cannot be empty".to_string(),
                ));
            }
            if self.converter.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(
                    "converter.timeout_secs must be > 0".to_string(),
                ));
            }
        }

        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.bind cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn key_or_env(value: &Option<String>, var: &str) -> Option<String> {
    // First check config value
    if let Some(key) = value {
        if !key.trim().is_empty() {
            return Some(key.trim().to_string());
        }
    }
    // Fall back to environment variable
    std::env::var(var).ok().filter(|k| !k.trim().is_empty())
}

fn http_settings(timeout_secs: u64, max_retries: u32, retry_base_delay_ms: u64) -> HttpSettings {
    HttpSettings {
        timeout: Duration::from_secs(timeout_secs),
        max_retries,
        retry_base_delay_ms,
    }
}

fn with_port(bind: &str, port: &str) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", bind, port),
    }
}

fn default_output_dir() -> String {
    "./outputs".to_string()
}

fn default_probe_order() -> Vec<String> {
    vec!["ethereum".to_string(), "polygon".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_etherscan_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_tronscan_url() -> String {
    "https://apilist.tronscanapi.com/api".to_string()
}

fn default_coingecko_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_recent_tx_limit() -> u32 {
    25
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_stable_contracts() -> Vec<String> {
    [
        // Ethereum: USDT, USDC, DAI
        "0xdac17f958d2ee523a2206206994597c13d831ec7",
        "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
        "0x6b175474e89094c44da98b954eedeac495271d0f",
        // Polygon: USDT, USDC (bridged), DAI
        "0xc2132d05d31c914a87c6611c10748aeb04b58e8f",
        "0x2791bca1f2de4661ed88a30c99a7a9449aa84174",
        "0x8f3cf7ad23cd3cadbd9735aff958023239c6a063",
        // TRON: USDT TRC-20
        "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_converter_binary() -> String {
    "soffice".to_string()
}

fn default_converter_timeout() -> u64 {
    60
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[output]
dir = "/tmp/reports"

[network]
evm_probe_order = ["polygon", "ethereum"]
enable_tron = false

[etherscan]
api_key = "ETHKEY"
timeout_secs = 10
max_retries = 2
recent_tx_limit = 5

[tronscan]
api_url = "https://tron.example/api"

[prices]
currency = "EUR"

[prices.asset_ids]
polygon = "polygon-ecosystem-token"

[labels]
stable_contracts = ["0xdAC17F958D2ee523a2206206994597C13D831ec7"]
flagged = ["0xbad0000000000000000000000000000000000bad"]

[converter]
binary = "libreoffice"
timeout_secs = 30

[server]
bind = "0.0.0.0:9000"

[logging]
level = "info"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.output.get_dir(), PathBuf::from("/tmp/reports"));
        assert_eq!(config.network.probe_order(), vec![Network::Polygon, Network::Ethereum]);
        assert!(!config.network.enable_tron);
        assert_eq!(config.etherscan.recent_tx_limit, 5);
        assert_eq!(config.tronscan.api_url, "https://tron.example/api");
        assert_eq!(config.converter.binary, "libreoffice");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.output.dir, "./outputs");
        assert_eq!(config.network.probe_order(), vec![Network::Ethereum, Network::Polygon]);
        assert!(config.network.enable_tron);
        assert_eq!(config.prices.currency, "usd");
        assert_eq!(config.converter.binary, "soffice");
        assert_eq!(config.converter.timeout_secs, 60);
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.logging.level, "warn");
        assert!(config.labels.label_set().is_stable_contract("tr7nhqjekqxgtci8q8zy4pl8otszgjlj6t"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[output\ndir = 3");
        assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_probe_network() {
        let file = write_config("[network]\nevm_probe_order = [\"ethereum\", \"solana\"]\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_tron_in_probe_order_rejected() {
        let file = write_config("[network]\nevm_probe_order = [\"tron\"]\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let file = write_config("[prices]\ntimeout_secs = 0\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_empty_currency_rejected() {
        let file = write_config("[prices]\ncurrency = \" \"\n");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_client_configs() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let etherscan = config.etherscan.client_config().unwrap();
        assert_eq!(etherscan.api_key, "ETHKEY");
        assert_eq!(etherscan.recent_tx_limit, 5);
        assert_eq!(etherscan.http.max_retries, 2);
        assert_eq!(etherscan.http.timeout, Duration::from_secs(10));

        let prices = config.prices.client_config();
        assert_eq!(prices.currency, "eur");
        assert_eq!(
            prices.asset_ids.get(&Network::Polygon).map(String::as_str),
            Some("polygon-ecosystem-token")
        );
        assert_eq!(prices.asset_ids.get(&Network::Ethereum).map(String::as_str), Some("ethereum"));
    }

    #[test]
    fn test_labels_case_insensitive() {
        let file = write_config(&create_valid_config());
        let labels = load_config(file.path()).unwrap().labels.label_set();
        assert!(labels.is_stable_contract("0xdac17f958d2ee523a2206206994597c13d831ec7"));
        assert!(labels.is_flagged("0xBAD0000000000000000000000000000000000BAD"));
    }

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("127.0.0.1:8000", "9001"), "127.0.0.1:9001");
        assert_eq!(with_port("localhost", "9001"), "localhost:9001");
    }

    #[test]
    fn test_config_key_wins_over_env() {
        let section = EtherscanSection {
            api_key: Some("from-config".to_string()),
            ..Default::default()
        };
        assert_eq!(section.get_api_key().as_deref(), Some("from-config"));
    }
}
