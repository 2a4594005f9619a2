use crate::{
    error::RegistryError,
    registry_client::RegistryApi,
};
use deployments::{
    ContractKind,
    ContractRecord,
    WalletIdentity,
};
use std::collections::BTreeMap;

/// Most recently known address per contract role for the active wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressCache {
    addresses: BTreeMap<ContractKind, String>,
}

impl AddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold registry records in order; later records for a role replace earlier ones.
    pub fn from_records(records: &[ContractRecord]) -> Self {
        let mut cache = Self::new();
        cache.apply(records);
        cache
    }

    pub fn apply(&mut self, records: &[ContractRecord]) {
        for record in records {
            self.insert(record.contract_type, record.address.clone());
        }
    }

    pub fn insert(&mut self, kind: ContractKind, address: impl Into<String>) {
        self.addresses.insert(kind, address.into());
    }

    pub fn get(&self, kind: ContractKind) -> Option<&str> {
        self.addresses.get(&kind).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContractKind, &str)> {
        self.addresses
            .iter()
            .map(|(kind, address)| (*kind, address.as_str()))
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn clear(&mut self) {
        self.addresses.clear();
    }
}

/// Pull the wallet's registry and fold it into a fresh cache.
pub async fn fetch_address_cache<R: RegistryApi>(
    registry: &R,
    wallet: &WalletIdentity,
) -> Result<AddressCache, RegistryError> {
    let records = registry.fetch_contracts(wallet).await?;
    tracing::info!("loaded {} registry records for {wallet}", records.len());
    Ok(AddressCache::from_records(&records))
}
