use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

use base_badge::chain::Address;
use base_badge::config::Config;
use base_badge::mint::{ContractMinter, Minter};
use base_badge::state::AppState;
use base_badge::types::MintResult;
use base_badge::{logging, metrics, server};

#[derive(Parser)]
#[command(name = "base_badge")]
#[command(about = "Base Beginner Badge Mini App backend")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the onboarding HTTP API
    Serve {
        /// Port to listen on (overrides PORT and config.toml)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Mint a badge directly from the deployer wallet
    Mint {
        /// Recipient address
        #[arg(long)]
        to: String,
    },
    /// Print the badge contract owner
    Owner,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{}:{}", config.server.host, port)
                .parse()
                .with_context(|| format!("invalid listen address {}:{}", config.server.host, port))?;

            if let Some(metrics_port) = config.server.metrics_port {
                metrics::init_metrics(metrics_port);
            }

            info!(
                "Starting on {} ({}, chain {})",
                addr,
                config.chain.network,
                config.chain.chain_id()
            );
            let state = AppState::from_config(config)?;
            server::start_server(state, addr).await?;
        }
        Commands::Mint { to } => {
            let to: Address = to.parse()?;
            let minter = ContractMinter::from_config(&config.chain)?;
            match minter.mint_badge(&to).await {
                MintResult::Minted { tx_hash } => {
                    println!("Minted badge to {}: {}", to, tx_hash);
                }
                MintResult::Failed { error: message } => {
                    error!("Mint to {} failed: {}", to, message);
                    anyhow::bail!("mint failed: {}", message);
                }
            }
        }
        Commands::Owner => {
            let minter = ContractMinter::from_config(&config.chain)?;
            let owner = minter.badge_owner().await?;
            println!("{}", owner);
        }
    }
    Ok(())
}
