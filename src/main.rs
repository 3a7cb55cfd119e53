//! BITTAP CLI - offline helpers for the Bittap wallet SDK
//!
//! Looks up network parameters and checks txid, asset id, address and URL
//! formats with the same rules the SDK applies before talking to the wallet.

use anyhow::{anyhow, Result};
use bittap_wallet_sdk::{get_networks, NetworkType, Utils};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::process::ExitCode;

/// Main CLI arguments
#[derive(Parser)]
#[command(name = "bittap")]
#[command(about = "BITTAP - network lookup and format checks for the Bittap wallet SDK")]
#[command(version = "0.1.0")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Print the parameters of a network as JSON
    Network {
        /// Network name (mainnet, testnet, regtest)
        name: String,
        /// Fail on unknown names instead of falling back to regtest
        #[arg(long)]
        strict: bool,
    },
    /// Check whether a value is well-formed
    Check {
        /// Kind of value
        #[arg(value_enum)]
        kind: CheckKind,
        /// Value to check
        value: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CheckKind {
    Txid,
    AssetId,
    Address,
    Url,
}

impl CheckKind {
    fn check(&self, value: &str) -> bool {
        match self {
            CheckKind::Txid => Utils::is_tx_id(value),
            CheckKind::AssetId => Utils::is_asset_id(value),
            CheckKind::Address => Utils::is_valid_bitcoin_address(value),
            CheckKind::Url => Utils::is_url(value),
        }
    }
}

fn main() -> Result<ExitCode> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match args.command {
        Commands::Network { name, strict } => {
            let params = if strict {
                name.parse::<NetworkType>()
                    .map_err(|e| anyhow!("Invalid network: {}", e))?
                    .params()
            } else {
                if NetworkType::resolve(&name).as_str() != name {
                    info!("Unknown network {}, using regtest parameters", name);
                }
                get_networks(&name)
            };
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { kind, value } => {
            debug!("Checking {:?} {}", kind, value);
            if kind.check(&value) {
                println!("valid");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("invalid");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
