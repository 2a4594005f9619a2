use anyhow::Context;
use clap::{
    Parser,
    ValueEnum,
};
use registry::app::{
    App,
    RunState,
    actix_registry_api::ActixRegistryApi,
    file_storage::FileRegistryStorage,
    init_tracing,
    registry_storage::RegistryStorage,
    sled_storage::SledRegistryStorage,
};
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StorageBackend {
    /// One JSON file per wallet
    File,
    /// Embedded sled database
    Sled,
}

#[derive(Parser, Debug)]
#[command(
    name = "registry",
    version,
    about = "Serve the wallet -> contract address registry over HTTP",
    long_about = None
)]
struct Args {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on (0 picks a free port)
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Where registries are persisted
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: String,

    #[arg(long, value_enum, default_value = "file")]
    storage: StorageBackend,

    #[arg(short, long, default_value = "false")]
    tracing: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_dir: Option<String>,
}

async fn handle_interupt() {
    let res = tokio::signal::ctrl_c().await;
    match res {
        Ok(_) => {
            tracing::info!("Received interrupt, exiting");
        }
        Err(_) => {
            tracing::warn!("Received interrupt error, exiting anyway");
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

async fn serve<S: RegistryStorage>(api: ActixRegistryApi, storage: S) -> anyhow::Result<()> {
    let mut app = App::new(api, storage);
    tracing::info!("Starting registry service");
    loop {
        let interrupt = handle_interupt();
        match app.run(interrupt).await? {
            RunState::Continue => continue,
            RunState::Exit => {
                tracing::info!("Exiting registry service");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let log_dir = args.log_dir.as_deref().map(expand_path);
    let _log_guard = if args.tracing {
        init_tracing(log_dir.as_deref())
    } else {
        None
    };

    let data_dir = expand_path(&args.data_dir);
    let api = ActixRegistryApi::new(&args.host, Some(args.port))
        .await
        .context("starting registry API")?;

    match args.storage {
        StorageBackend::File => {
            let storage = FileRegistryStorage::open(&data_dir)
                .context("opening file registry storage")?;
            tracing::info!("Using file registry storage in {}", data_dir.display());
            serve(api, storage).await
        }
        StorageBackend::Sled => {
            let storage = SledRegistryStorage::open(&data_dir)
                .context("opening sled registry storage")?;
            tracing::info!("Using sled registry storage in {}", data_dir.display());
            serve(api, storage).await
        }
    }
}
