use crate::{
    Result,
    app::{
        registry_storage::RegistryStorage,
        request_api::{
            DeleteContractsRequest,
            ListContractsRequest,
            Request,
            RequestAPI,
            SaveContractRequest,
        },
    },
};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub mod actix_registry_api;
pub mod file_storage;
pub mod in_memory_storage;
pub mod registry_storage;
pub mod request_api;
pub mod sled_storage;


/// Owns the registry storage and answers requests one at a time, so every
/// read-modify-write on a wallet's registry is serialized.
pub struct App<API, Storage> {
    api: API,
    storage: Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Continue,
    Exit,
}

impl<API, Storage> App<API, Storage> {
    pub fn new(api: API, storage: Storage) -> Self {
        Self { api, storage }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn into_parts(self) -> (API, Storage) {
        (self.api, self.storage)
    }
}

impl<API: RequestAPI, Storage: RegistryStorage> App<API, Storage> {
    pub async fn run<I: Future<Output = ()>>(&mut self, interrupt: I) -> Result<RunState> {
        tokio::select! {
            request = self.api.next_request() => {
                let request = request?;
                self.handle_request(request);
                Ok(RunState::Continue)
            }
            _ = interrupt => {
                tracing::info!("interrupt received, stopping registry service");
                Ok(RunState::Exit)
            }
        }
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::ListContracts(ListContractsRequest { wallet, sender }) => {
                let result = self.storage.read(&wallet);
                match &result {
                    Ok(records) => {
                        tracing::info!("loaded {} contracts for {wallet}", records.len())
                    }
                    Err(e) => tracing::error!("failed to read registry for {wallet}: {e:#}"),
                }
                if sender.send(result).is_err() {
                    tracing::warn!("list requester for {wallet} went away");
                }
            }
            Request::SaveContract(SaveContractRequest {
                wallet,
                record,
                sender,
            }) => {
                let result = self.storage.append(&wallet, &record);
                match &result {
                    Ok(()) => tracing::info!(
                        "contract saved for {wallet}: {} at {}",
                        record.contract_type,
                        record.address
                    ),
                    Err(e) => tracing::error!("failed to save contract for {wallet}: {e:#}"),
                }
                if sender.send(result).is_err() {
                    tracing::warn!("save requester for {wallet} went away");
                }
            }
            Request::DeleteContracts(DeleteContractsRequest { wallet, sender }) => {
                let result = self.storage.delete(&wallet);
                match &result {
                    Ok(()) => tracing::info!("registry deleted for {wallet}"),
                    Err(e) => {
                        tracing::error!("failed to delete registry for {wallet}: {e:#}")
                    }
                }
                if sender.send(result).is_err() {
                    tracing::warn!("delete requester for {wallet} went away");
                }
            }
        }
    }
}

/// Install the global subscriber. Filtering follows `RUST_LOG`, defaulting to
/// `info`. When `log_dir` is set a daily rolling file is written as well; keep
/// the returned guard alive for as long as logs should be flushed.
pub fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "registry.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init();
    guard
}
