mod commands;

use anyhow::{
    Context,
    Result,
};
use clap::{
    Parser,
    Subcommand,
};
use deployments::{
    ContractKind,
    WalletIdentity,
};
use orchestrator::HttpRegistryClient;
use std::{
    io,
    path::PathBuf,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_REGISTRY_URL: &str = "http://127.0.0.1:3000";

#[derive(Parser, Debug)]
#[command(
    name = "deploy-cli",
    about = "Inspect and maintain the per-wallet contract registry",
    version
)]
struct Args {
    /// Base URL of the registry service
    #[arg(long, global = true, default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// Print tracing output to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    tracing: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every contract recorded for a wallet
    List {
        #[arg(long)]
        wallet: String,
    },
    /// Record one deployed contract
    Save {
        #[arg(long)]
        wallet: String,
        /// e.g. ContractManager, Token, NFT, VotingSystem
        #[arg(long)]
        contract_type: String,
        #[arg(long)]
        address: String,
    },
    /// Delete every contract recorded for a wallet
    Delete {
        #[arg(long)]
        wallet: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Resolve the latest address per contract role for a wallet
    Sync {
        #[arg(long)]
        wallet: String,
    },
    /// Validate a directory of `<Kind>.abi.json` + `<Kind>.bin` artifacts
    Artifacts {
        #[arg(long)]
        dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.tracing {
        init_tracing();
    }

    let mut out = io::stdout().lock();
    let timeout = Duration::from_secs(args.timeout_secs);
    let registry = || -> Result<HttpRegistryClient> {
        let client = HttpRegistryClient::new(&args.registry_url, timeout)?;
        tracing::debug!("using registry at {}", client.base_url());
        Ok(client)
    };

    match args.command {
        Command::List { wallet } => {
            commands::list(&registry()?, &parse_wallet(&wallet)?, &mut out).await
        }
        Command::Save {
            wallet,
            contract_type,
            address,
        } => {
            let kind: ContractKind = contract_type.parse()?;
            commands::save(&registry()?, &parse_wallet(&wallet)?, kind, &address, &mut out)
                .await
        }
        Command::Delete { wallet, yes } => {
            let mut input = io::stdin().lock();
            commands::delete(&registry()?, &parse_wallet(&wallet)?, yes, &mut input, &mut out)
                .await
        }
        Command::Sync { wallet } => {
            commands::sync(&registry()?, &parse_wallet(&wallet)?, &mut out).await
        }
        Command::Artifacts { dir } => commands::artifacts(&expand_path(&dir), &mut out),
    }
}

fn parse_wallet(raw: &str) -> Result<WalletIdentity> {
    WalletIdentity::parse(raw).with_context(|| format!("invalid wallet '{raw}'"))
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
