use crate::{
    cache::AddressCache,
    deployment::record_address,
    error::RegistryError,
    registry_client::RegistryApi,
    signer::{
        ChainError,
        ChainSigner,
        bounded,
    },
};
use deployments::{
    ContractKind,
    MANAGER_CHILDREN,
    WalletIdentity,
};
use futures::future::join_all;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAddress {
    pub address: String,
    pub registry_warning: Option<RegistryError>,
}

/// What happened to one child of a freshly deployed manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildDiscovery {
    pub kind: ContractKind,
    pub outcome: Result<RecordedAddress, ChainError>,
}

impl ChildDiscovery {
    pub fn is_recorded(&self) -> bool {
        matches!(
            &self.outcome,
            Ok(RecordedAddress {
                registry_warning: None,
                ..
            })
        )
    }

    pub fn address(&self) -> Option<&str> {
        self.outcome
            .as_ref()
            .ok()
            .map(|recorded| recorded.address.as_str())
    }
}

/// Ask the manager for each child's address and record the ones it returns.
///
/// The lookups run concurrently and each is bounded by `query_timeout`, so a
/// manager that never answers one getter costs at most that long. Recording
/// then happens in child order so the registry lists children in a stable
/// order. A failed lookup only drops its own child.
pub async fn discover_children<S: ChainSigner, R: RegistryApi>(
    signer: &S,
    registry: &R,
    cache: &mut AddressCache,
    wallet: &WalletIdentity,
    manager_address: &str,
    query_timeout: Duration,
) -> Vec<ChildDiscovery> {
    let lookups = MANAGER_CHILDREN
        .into_iter()
        .filter_map(ContractKind::manager_query)
        .map(|query| async move {
            tracing::debug!("querying manager {manager_address} via {}", query.method_name());
            let lookup = bounded(query_timeout, signer.call_read(manager_address, query)).await;
            (query.child(), lookup)
        });
    let found = join_all(lookups).await;

    let mut discoveries = Vec::with_capacity(found.len());
    for (kind, lookup) in found {
        let outcome = match lookup {
            Ok(address) => {
                let registry_warning =
                    record_address(registry, cache, wallet, kind, &address).await;
                Ok(RecordedAddress {
                    address,
                    registry_warning,
                })
            }
            Err(e) => {
                tracing::warn!("could not read {kind} address from manager: {e}");
                Err(e)
            }
        };
        discoveries.push(ChildDiscovery { kind, outcome });
    }
    discoveries
}
