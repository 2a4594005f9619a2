use crate::{
    cache::{
        AddressCache,
        fetch_address_cache,
    },
    config::OrchestratorConfig,
    deployment::{
        DeploymentReport,
        deploy_contract,
    },
    discovery::discover_children,
    error::{
        DeployError,
        RegistryError,
    },
    registry_client::RegistryApi,
    signer::ChainSigner,
};
use deployments::{
    ArtifactCatalog,
    ContractKind,
    WalletIdentity,
};


/// Result of pulling the registry into the address cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced { roles: usize },
    /// the registry could not be read; the session keeps going without it
    Unavailable(RegistryError),
}

/// A connected wallet together with everything needed to deploy and record
/// contracts for it.
///
/// Deployments take `&mut self`, so one session never runs two at once.
pub struct Session<S, R> {
    wallet: WalletIdentity,
    signer: S,
    registry: R,
    artifacts: ArtifactCatalog,
    config: OrchestratorConfig,
    cache: AddressCache,
}

impl<S: ChainSigner, R: RegistryApi> Session<S, R> {
    /// Bind to the signer's active wallet and rebuild the cache from the registry.
    ///
    /// Only a missing wallet is an error. A registry that cannot be reached
    /// leaves the cache empty, the same state a first-time wallet starts in.
    pub async fn connect(
        signer: S,
        registry: R,
        artifacts: ArtifactCatalog,
        config: OrchestratorConfig,
    ) -> Result<(Self, SyncOutcome), DeployError> {
        let wallet = signer.current_identity().ok_or(DeployError::NotConnected)?;
        tracing::info!("connecting session for {wallet}");
        let mut session = Self {
            wallet,
            signer,
            registry,
            artifacts,
            config,
            cache: AddressCache::new(),
        };
        let outcome = session.resync().await;
        Ok((session, outcome))
    }

    /// Re-read the registry. On failure the current cache is kept as is.
    pub async fn resync(&mut self) -> SyncOutcome {
        match fetch_address_cache(&self.registry, &self.wallet).await {
            Ok(cache) => {
                self.cache = cache;
                SyncOutcome::Synced {
                    roles: self.cache.len(),
                }
            }
            Err(e) => {
                tracing::warn!("registry sync failed for {}: {e}", self.wallet);
                SyncOutcome::Unavailable(e)
            }
        }
    }

    /// Deploy one contract. Deploying the manager also records its children.
    pub async fn deploy(&mut self, kind: ContractKind) -> Result<DeploymentReport, DeployError> {
        let mut report = deploy_contract(
            &self.signer,
            &self.registry,
            &self.artifacts,
            &self.config,
            &mut self.cache,
            &self.wallet,
            kind,
        )
        .await?;
        if kind.is_manager() {
            report.children = discover_children(
                &self.signer,
                &self.registry,
                &mut self.cache,
                &self.wallet,
                &report.address,
                self.config.query_timeout,
            )
            .await;
        }
        Ok(report)
    }

    /// Wallet-initiated wipe of every stored record. The cache is cleared only
    /// when the registry confirms the delete.
    pub async fn delete_registry(&mut self) -> Result<(), RegistryError> {
        self.registry.delete_contracts(&self.wallet).await?;
        tracing::info!("deleted registry for {}", self.wallet);
        self.cache.clear();
        Ok(())
    }
}

impl<S, R> Session<S, R> {
    pub fn wallet(&self) -> &WalletIdentity {
        &self.wallet
    }

    pub fn address(&self, kind: ContractKind) -> Option<&str> {
        self.cache.get(kind)
    }

    pub fn addresses(&self) -> &AddressCache {
        &self.cache
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// End the session, discarding the cache and handing back the collaborators.
    pub fn disconnect(self) -> (S, R) {
        tracing::info!("disconnecting session for {}", self.wallet);
        (self.signer, self.registry)
    }
}
