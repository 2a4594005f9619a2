use crate::{
    cache::AddressCache,
    config::OrchestratorConfig,
    discovery::ChildDiscovery,
    error::{
        DeployError,
        RegistryError,
    },
    registry_client::RegistryApi,
    signer::{
        ChainSigner,
        bounded,
    },
};
use chrono::Utc;
use deployments::{
    ArtifactCatalog,
    ContractKind,
    ContractRecord,
    WalletIdentity,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentStage {
    Idle,
    Deploying,
    Confirming,
    Recording,
    Done,
    Failed,
}

impl DeploymentStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentStage::Done | DeploymentStage::Failed)
    }

    fn can_advance_to(self, next: DeploymentStage) -> bool {
        use DeploymentStage::*;
        match (self, next) {
            (Idle, Deploying)
            | (Deploying, Confirming)
            | (Confirming, Recording)
            | (Recording, Done) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentStage::Idle => "idle",
            DeploymentStage::Deploying => "deploying",
            DeploymentStage::Confirming => "confirming",
            DeploymentStage::Recording => "recording",
            DeploymentStage::Done => "done",
            DeploymentStage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    pub kind: ContractKind,
    pub address: String,
    pub tx_id: String,
    pub stage: DeploymentStage,
    /// RFC 3339 timestamp taken when the address was recorded
    pub deployed_at: String,
    /// set when the contract is live but the registry write failed
    pub registry_warning: Option<RegistryError>,
    /// only populated for manager deployments
    pub children: Vec<ChildDiscovery>,
}

impl DeploymentReport {
    /// True when the contract and every discovered child reached the registry.
    pub fn is_fully_recorded(&self) -> bool {
        self.registry_warning.is_none()
            && self.children.iter().all(ChildDiscovery::is_recorded)
    }
}

/// Tracks one deployment through its stages.
struct Deployment {
    kind: ContractKind,
    stage: DeploymentStage,
}

impl Deployment {
    fn new(kind: ContractKind) -> Self {
        Self {
            kind,
            stage: DeploymentStage::Idle,
        }
    }

    fn advance(&mut self, next: DeploymentStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "invalid deployment transition {} -> {}",
            self.stage,
            next
        );
        tracing::debug!("{} deployment: {} -> {}", self.kind, self.stage, next);
        self.stage = next;
    }

    fn fail(&mut self, error: DeployError) -> DeployError {
        tracing::error!("{} deployment failed while {}: {error}", self.kind, self.stage);
        self.advance(DeploymentStage::Failed);
        error
    }
}

/// Deploy `kind`, wait for finalization and record the address.
///
/// Every chain call is bounded by its configured timeout. Chain failures return
/// an error before anything is persisted. A registry
/// failure after finalization still yields a `Done` report, with the failure in
/// `registry_warning`, and the cache is updated either way.
pub async fn deploy_contract<S: ChainSigner, R: RegistryApi>(
    signer: &S,
    registry: &R,
    artifacts: &ArtifactCatalog,
    config: &OrchestratorConfig,
    cache: &mut AddressCache,
    wallet: &WalletIdentity,
    kind: ContractKind,
) -> Result<DeploymentReport, DeployError> {
    let mut deployment = Deployment::new(kind);

    deployment.advance(DeploymentStage::Deploying);
    match signer.current_identity() {
        Some(active) if active == *wallet => {}
        Some(active) => {
            tracing::warn!("signer switched from {wallet} to {active}; reconnect required");
            return Err(deployment.fail(DeployError::NotConnected));
        }
        None => return Err(deployment.fail(DeployError::NotConnected)),
    }
    let Some(artifact) = artifacts.get(kind) else {
        return Err(deployment.fail(DeployError::MissingArtifact(kind)));
    };
    tracing::info!(
        "deploying {kind} for {wallet} (bytecode {})",
        artifact.bytecode_hash()
    );
    let submitted = bounded(config.submission_timeout, signer.deploy_contract(artifact)).await;
    let pending = match submitted {
        Ok(pending) => pending,
        Err(e) => return Err(deployment.fail(e.into())),
    };

    deployment.advance(DeploymentStage::Confirming);
    let finalized = bounded(
        config.finalization_timeout,
        signer.await_finalization(&pending),
    )
    .await;
    let address = match finalized {
        Ok(address) => address,
        Err(e) => return Err(deployment.fail(e.into())),
    };
    tracing::info!("{kind} deployed at {address} (tx {})", pending.tx_id);

    deployment.advance(DeploymentStage::Recording);
    let registry_warning = record_address(registry, cache, wallet, kind, &address).await;

    deployment.advance(DeploymentStage::Done);
    Ok(DeploymentReport {
        kind,
        address,
        tx_id: pending.tx_id,
        stage: deployment.stage,
        deployed_at: Utc::now().to_rfc3339(),
        registry_warning,
        children: Vec::new(),
    })
}

/// Persist one address and update the cache regardless of the outcome.
pub(crate) async fn record_address<R: RegistryApi>(
    registry: &R,
    cache: &mut AddressCache,
    wallet: &WalletIdentity,
    kind: ContractKind,
    address: &str,
) -> Option<RegistryError> {
    let record = ContractRecord::new(kind, address);
    let warning = match registry.save_contract(wallet, &record).await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(
                "{kind} at {address} saved locally only, resync may be needed later: {e}"
            );
            Some(e)
        }
    };
    cache.insert(kind, address);
    warning
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn can_advance_to__follows_the_happy_path_only() {
        use DeploymentStage::*;
        assert!(Idle.can_advance_to(Deploying));
        assert!(Deploying.can_advance_to(Confirming));
        assert!(Confirming.can_advance_to(Recording));
        assert!(Recording.can_advance_to(Done));
        assert!(!Idle.can_advance_to(Recording));
        assert!(!Confirming.can_advance_to(Done));
    }

    #[test]
    fn can_advance_to__failed_only_from_non_terminal_stages() {
        use DeploymentStage::*;
        for stage in [Idle, Deploying, Confirming, Recording] {
            assert!(stage.can_advance_to(Failed));
        }
        assert!(!Done.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Failed));
    }
}
