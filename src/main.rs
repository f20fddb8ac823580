//! Chain Investigator - wallet and transaction reports from public explorers

use anyhow::Result;
use clap::Parser;

use chain_investigator::adapters::cli::{self, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API keys go here, not in the config file)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::execute(app).await
}
