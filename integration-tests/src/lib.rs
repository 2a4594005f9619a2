//! Shared fixtures for running the orchestrator against a live registry service.

use deployments::{
    ArtifactCatalog,
    ContractArtifact,
    ContractKind,
    ManagerQuery,
    WalletIdentity,
};
use orchestrator::{
    ChainError,
    ChainSigner,
    HttpRegistryClient,
    OrchestratorConfig,
    PendingTx,
};
use registry::app::{
    App,
    RunState,
    actix_registry_api::ActixRegistryApi,
    registry_storage::RegistryStorage,
};
use std::{
    future::pending,
    sync::{
        Arc,
        Mutex,
    },
};

/// A registry service bound to an ephemeral port.
///
/// The service loop only makes progress inside [`TestRegistry::drive`], so each
/// test decides exactly when requests are answered.
pub struct TestRegistry<S> {
    app: App<ActixRegistryApi, S>,
    base_url: String,
}

impl<S: RegistryStorage> TestRegistry<S> {
    pub async fn start(storage: S) -> Self {
        let api = ActixRegistryApi::new("127.0.0.1", None).await.unwrap();
        let base_url = api.base_url().to_string();
        Self {
            app: App::new(api, storage),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> HttpRegistryClient {
        HttpRegistryClient::new(
            &self.base_url,
            OrchestratorConfig::default().request_timeout,
        )
        .unwrap()
    }

    pub fn storage(&self) -> &S {
        self.app.storage()
    }

    /// Serve requests until `client` completes.
    pub async fn drive<T>(&mut self, client: impl Future<Output = T>) -> T {
        let mut client = std::pin::pin!(client);
        loop {
            tokio::select! {
                out = &mut client => return out,
                state = self.app.run(pending()) => {
                    assert_eq!(state.unwrap(), RunState::Continue);
                }
            }
        }
    }

    /// Stop the HTTP server and hand back the storage.
    pub fn stop(self) -> S {
        let (api, storage) = self.app.into_parts();
        drop(api);
        storage
    }
}

/// Signer that deploys every contract at a fixed address per kind and answers
/// manager lookups from a table.
#[derive(Clone)]
pub struct ScriptedSigner {
    identity: Arc<Mutex<Option<WalletIdentity>>>,
    next_tx: Arc<Mutex<u64>>,
}

pub const MANAGER_ADDRESS: &str = "0xM";

impl ScriptedSigner {
    pub fn new(wallet: &str) -> Self {
        Self {
            identity: Arc::new(Mutex::new(Some(WalletIdentity::parse(wallet).unwrap()))),
            next_tx: Arc::new(Mutex::new(0)),
        }
    }

    pub fn address_of(kind: ContractKind) -> String {
        match kind {
            ContractKind::ContractManager => MANAGER_ADDRESS.to_string(),
            ContractKind::Token => "0xA".to_string(),
            ContractKind::Nft => "0xB".to_string(),
            ContractKind::VotingSystem => "0xC".to_string(),
            ContractKind::BatchTransaction => "0xD".to_string(),
            other => format!("0x{other}"),
        }
    }
}

impl ChainSigner for ScriptedSigner {
    fn current_identity(&self) -> Option<WalletIdentity> {
        self.identity.lock().unwrap().clone()
    }

    async fn deploy_contract(&self, artifact: &ContractArtifact) -> Result<PendingTx, ChainError> {
        let mut next = self.next_tx.lock().unwrap();
        *next += 1;
        tracing::debug!("scripted deploy #{next} of {}", artifact.kind);
        Ok(PendingTx::new(format!("{}:{}", next, artifact.kind)))
    }

    async fn await_finalization(&self, tx: &PendingTx) -> Result<String, ChainError> {
        let kind = tx
            .tx_id
            .split_once(':')
            .and_then(|(_, kind)| kind.parse::<ContractKind>().ok())
            .ok_or_else(|| ChainError::Reverted(format!("unknown tx {}", tx.tx_id)))?;
        Ok(Self::address_of(kind))
    }

    async fn call_read(&self, contract: &str, query: ManagerQuery) -> Result<String, ChainError> {
        if contract != MANAGER_ADDRESS {
            return Err(ChainError::Reverted(format!("{contract} is not a manager")));
        }
        Ok(Self::address_of(query.child()))
    }
}

pub fn all_artifacts() -> ArtifactCatalog {
    let mut catalog = ArtifactCatalog::new();
    for kind in ContractKind::ALL {
        catalog.insert(ContractArtifact::new(
            kind,
            serde_json::json!([]),
            vec![0x60, 0x80, 0x60, 0x40],
        ));
    }
    catalog
}
