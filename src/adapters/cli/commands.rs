//! CLI Command Handlers
//!
//! Implementation of the `report`, `serve` and `doctor` commands.

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::adapters::web::{self, AppState};
use crate::application::{Investigation, InvestigationError, Investigator};
use crate::config::{load_or_default, Config};
use crate::domain::{KindHint, NetworkHint};
use crate::render::locate_converter;

/// Chain Investigator - wallet and transaction reports from public explorers
#[derive(Parser, Debug)]
#[command(
    name = "chain-investigator",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Wallet and transaction reports for Ethereum, Polygon and TRON",
    long_about = "Chain Investigator validates a wallet address or transaction hash, \
                  queries block explorers and a price aggregator, and writes a report \
                  as DOCX, PDF (when an office suite is installed) and CSV."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Investigate one address or transaction and write the report files
    Report(ReportCmd),

    /// Start the local web interface
    Serve(ServeCmd),

    /// Show which data sources and tools are available
    Doctor(DoctorCmd),
}

/// Investigate one identifier
#[derive(Parser, Debug)]
#[command(group(
    ArgGroup::new("identifier")
        .required(true)
        .args(["address", "tx", "id"])
))]
pub struct ReportCmd {
    /// Wallet address (0x... or TRON T...)
    #[arg(long, value_name = "ADDR")]
    pub address: Option<String>,

    /// Transaction hash
    #[arg(long, value_name = "HASH")]
    pub tx: Option<String>,

    /// Address or hash, kind detected from the format
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Network (auto, ethereum, polygon, tron)
    #[arg(short, long, value_name = "NETWORK", default_value = "auto")]
    pub network: NetworkHint,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ReportCmd {
    /// The identifier and the kind constraint its flag implies
    pub fn identifier(&self) -> (&str, KindHint) {
        match (&self.address, &self.tx, &self.id) {
            (Some(addr), _, _) => (addr, KindHint::Address),
            (_, Some(tx), _) => (tx, KindHint::Transaction),
            (_, _, Some(id)) => (id, KindHint::Auto),
            _ => ("", KindHint::Auto),
        }
    }
}

/// Start the web interface
#[derive(Parser, Debug)]
pub struct ServeCmd {
    /// Address to listen on (default from config, PORT env overrides the port)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Environment check
#[derive(Parser, Debug)]
pub struct DoctorCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Command {
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Report(cmd) => cmd.config.as_ref(),
            Command::Serve(cmd) => cmd.config.as_ref(),
            Command::Doctor(cmd) => cmd.config.as_ref(),
        }
    }
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_or_default(app.command.config_path().map(|p| p.as_path()))
        .context("Failed to load configuration")?;

    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Report(cmd) => report_command(cmd, config).await,
        Command::Serve(cmd) => serve_command(cmd, config).await,
        Command::Doctor(_) => doctor_command(config).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Handle report command
async fn report_command(cmd: ReportCmd, mut config: Config) -> Result<()> {
    if let Some(dir) = &cmd.output_dir {
        config.output.dir = dir.to_string_lossy().into_owned();
    }
    let investigator = Investigator::from_config(&config)
        .context("Failed to set up data sources")?;

    let (input, kind) = cmd.identifier();
    tracing::info!("Report requested for {}", input.trim());

    let investigation = match investigator.investigate(input, kind, cmd.network).await {
        Ok(inv) => inv,
        Err(InvestigationError::InvalidIdentifier(e)) => bail!("{}", e),
        Err(e) => return Err(e).context("Report failed"),
    };

    print_investigation(&investigation);
    Ok(())
}

fn print_investigation(inv: &Investigation) {
    let report = &inv.report;

    println!("Report for {} ({})", report.identifier, report.identifier.kind());
    for line in &report.summary.lines {
        println!("  {}", line);
    }

    let unavailable: Vec<_> = report.unavailable_sources().collect();
    if !unavailable.is_empty() {
        println!();
        println!("Unavailable sources:");
        for status in unavailable {
            println!("  {} ({}): {}", status.source, status.role, status.state);
        }
    }

    println!();
    println!("Files:");
    for artifact in &inv.output.artifacts {
        println!("  {}", artifact.path.display());
    }
    println!("  PDF: {}", inv.output.pdf.describe());
    println!("  CSV: {}", inv.output.csv.describe());
}

/// Handle serve command
async fn serve_command(cmd: ServeCmd, config: Config) -> Result<()> {
    let bind = cmd.bind.unwrap_or_else(|| config.server.get_bind());
    let investigator = Investigator::from_config(&config)
        .context("Failed to set up data sources")?;

    let state = Arc::new(AppState::new(investigator));
    println!("Serving on http://{}", bind);
    web::serve(state, &bind)
        .await
        .with_context(|| format!("Web server on {} stopped", bind))?;
    Ok(())
}

/// Handle doctor command
async fn doctor_command(config: Config) -> Result<()> {
    let investigator = Investigator::from_config(&config)
        .context("Failed to set up data sources")?;

    println!("Data sources:");
    for adapter in investigator.adapters() {
        let state = if adapter.enabled { "enabled" } else { "skipped" };
        println!("  {:<10} {:<17} {:<8} {}", adapter.name, adapter.role.to_string(), state, adapter.note);
    }

    let converter = investigator.renderer().converter();
    println!();
    if !converter.enabled {
        println!("PDF converter: disabled in configuration");
    } else {
        match locate_converter(&converter.binary) {
            Ok(path) => println!("PDF converter: {}", path.display()),
            Err(e) => println!("PDF converter: unavailable ({}), reports will be DOCX and CSV only", e),
        }
    }

    println!("Output directory: {}", investigator.renderer().output_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Network;

    const ADDR: &str = "0x00000000219ab540356cbb839cbe05303d7705fa";

    #[test]
    fn test_cli_app_parse_report_address() {
        let args = vec!["chain-investigator", "report", "--address", ADDR];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Report(cmd) => {
                assert_eq!(cmd.identifier(), (ADDR, KindHint::Address));
                assert_eq!(cmd.network, NetworkHint::Auto);
                assert!(cmd.output_dir.is_none());
                assert!(cmd.config.is_none());
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_cli_app_parse_report_tx_with_network() {
        let args = vec![
            "chain-investigator",
            "report",
            "--tx",
            "0xabc",
            "--network",
            "polygon",
            "--output-dir",
            "/tmp/out",
        ];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Report(cmd) => {
                assert_eq!(cmd.identifier(), ("0xabc", KindHint::Transaction));
                assert_eq!(cmd.network, NetworkHint::Exact(Network::Polygon));
                assert_eq!(cmd.output_dir, Some(PathBuf::from("/tmp/out")));
            }
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_cli_app_parse_report_auto_id() {
        let args = vec!["chain-investigator", "report", "--id", "TXYZ"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Report(cmd) => assert_eq!(cmd.identifier(), ("TXYZ", KindHint::Auto)),
            _ => panic!("Expected Report command"),
        }
    }

    #[test]
    fn test_report_requires_one_identifier() {
        let none = vec!["chain-investigator", "report"];
        assert!(CliApp::try_parse_from(none).is_err());

        let both = vec!["chain-investigator", "report", "--address", ADDR, "--tx", "0xabc"];
        assert!(CliApp::try_parse_from(both).is_err());
    }

    #[test]
    fn test_report_rejects_unknown_network() {
        let args = vec!["chain-investigator", "report", "--id", ADDR, "--network", "solana"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_serve() {
        let args = vec!["chain-investigator", "serve", "--bind", "0.0.0.0:9000", "-c", "custom.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Serve(cmd) => {
                assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:9000"));
                assert_eq!(cmd.config, Some(PathBuf::from("custom.toml")));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_app_parse_doctor() {
        let args = vec!["chain-investigator", "doctor"];
        let app = CliApp::try_parse_from(args).unwrap();
        assert!(matches!(app.command, Command::Doctor(_)));
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["chain-investigator", "doctor", "--verbose", "--debug"];
        let app = CliApp::try_parse_from(args).unwrap();
        assert!(app.verbose);
        assert!(app.debug);
    }

    #[test]
    fn test_config_path_is_per_command() {
        let args = vec!["chain-investigator", "doctor", "--config", "a.toml"];
        let app = CliApp::try_parse_from(args).unwrap();
        assert_eq!(app.command.config_path(), Some(&PathBuf::from("a.toml")));
    }
}
