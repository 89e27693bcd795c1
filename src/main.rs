//! Mint agent CLI
//!
//! Command-line surface over the wallet session and mint controller.

use clap::{Parser, Subcommand};
use game_asset_minter::{MintConfig, MintService, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "minter")]
#[command(about = "Wallet session and mint manager for GameAssetNFT")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the wallet and print the active account
    Connect,

    /// Mint a token and wait for confirmation
    Mint {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Token metadata URI
        #[arg(long)]
        uri: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = if let Some(config_path) = cli.config {
        MintConfig::load(&config_path)?
    } else {
        MintConfig::from_env()
    };

    match cli.command {
        Commands::Connect => run_connect(config).await?,
        Commands::Mint { to, uri } => run_mint(config, to, uri).await?,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn build_service(config: &MintConfig) -> Result<MintService> {
    use game_asset_minter::config::PRIVATE_KEY_ENV;
    use game_asset_minter::provider::InjectedProvider;
    use game_asset_minter::wallet::LocalWalletProvider;
    use game_asset_minter::RpcConfig;

    let provider: Option<Arc<dyn InjectedProvider>> = if std::env::var(PRIVATE_KEY_ENV).is_ok() {
        let rpc = RpcConfig::from_env();
        let rpc_url = rpc.for_network(config.network).ok_or_else(|| {
            game_asset_minter::Error::Config(format!(
                "no RPC URL configured for {}",
                config.network.name()
            ))
        })?;

        let wallet = LocalWalletProvider::from_env(rpc_url, config.confirmation.clone())?;
        tracing::info!(
            address = %wallet.address(),
            network = config.network.name(),
            "Loaded wallet from PRIVATE_KEY"
        );
        Some(Arc::new(wallet))
    } else {
        tracing::warn!("No PRIVATE_KEY set - no wallet provider available");
        None
    };

    Ok(MintService::new(config, provider))
}

async fn run_connect(config: MintConfig) -> Result<()> {
    let service = build_service(&config)?;
    let session = service.connect().await?;

    println!("Connected");
    if let Some(account) = session.account {
        println!("  Account:  {account}");
    }
    if let Some(contract) = &session.contract {
        println!("  Contract: {}", contract.address());
    }
    Ok(())
}

async fn run_mint(config: MintConfig, to: String, uri: String) -> Result<()> {
    let service = build_service(&config)?;
    let session = service.connect().await?;
    tracing::info!(account = ?session.account, "Wallet connected");

    let record = service.mint(to, uri).await?;

    println!("Mint confirmed");
    println!("  Record:      {}", record.id);
    if let Some(tx_hash) = record.tx_hash {
        println!("  Transaction: {tx_hash}");
    }
    Ok(())
}
