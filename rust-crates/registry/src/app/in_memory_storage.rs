use crate::app::registry_storage::RegistryStorage;
use anyhow::anyhow;
use deployments::{
    ContractRecord,
    WalletIdentity,
};
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
};

type Registries = BTreeMap<String, Vec<ContractRecord>>;

#[derive(Clone, Default)]
pub struct InMemoryRegistryStorage {
    registries: Arc<Mutex<Registries>>,
}

impl InMemoryRegistryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registries(&self) -> Arc<Mutex<Registries>> {
        self.registries.clone()
    }

    fn lock(&self) -> crate::Result<MutexGuard<'_, Registries>> {
        self.registries
            .lock()
            .map_err(|_| anyhow!("in-memory registry lock poisoned"))
    }
}

impl RegistryStorage for InMemoryRegistryStorage {
    fn wallets(&self) -> crate::Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn read_exact(&self, wallet: &str) -> crate::Result<Option<Vec<ContractRecord>>> {
        Ok(self.lock()?.get(wallet).cloned())
    }

    fn append(
        &mut self,
        wallet: &WalletIdentity,
        record: &ContractRecord,
    ) -> crate::Result<()> {
        self.lock()?
            .entry(wallet.as_str().to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn delete(&mut self, wallet: &WalletIdentity) -> crate::Result<()> {
        self.lock()?.remove(wallet.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use deployments::ContractKind;
    use proptest::prelude::*;

    fn wallet(raw: &str) -> WalletIdentity {
        WalletIdentity::parse(raw).unwrap()
    }

    #[test]
    fn read__unknown_wallet__returns_empty_registry() {
        let storage = InMemoryRegistryStorage::new();

        let records = storage.read(&wallet("0xNeverWritten")).unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn append__then_read__ends_with_appended_record() {
        // given
        let mut storage = InMemoryRegistryStorage::new();
        let owner = wallet("0xAbC");
        let first = ContractRecord::new(ContractKind::ContractManager, "0x1");
        let second = ContractRecord::new(ContractKind::Token, "0x2");

        // when
        storage.append(&owner, &first).unwrap();
        storage.append(&owner, &second).unwrap();

        // then
        let records = storage.read(&owner).unwrap();
        assert_eq!(records, vec![first, second]);
    }

    #[test]
    fn append__different_casing__writes_separate_entries() {
        // given
        let mut storage = InMemoryRegistryStorage::new();
        let upper = wallet("0xABC");
        let lower = wallet("0xabc");

        // when
        storage
            .append(&upper, &ContractRecord::new(ContractKind::Token, "0x1"))
            .unwrap();
        storage
            .append(&lower, &ContractRecord::new(ContractKind::Nft, "0x2"))
            .unwrap();

        // then
        let keys = storage.wallets().unwrap();
        assert_eq!(keys, vec!["0xABC".to_string(), "0xabc".to_string()]);
        assert_eq!(storage.read(&upper).unwrap().len(), 1);
        assert_eq!(storage.read(&lower).unwrap()[0].contract_type, ContractKind::Nft);
    }

    #[test]
    fn delete__is_idempotent() {
        // given
        let mut storage = InMemoryRegistryStorage::new();
        let owner = wallet("0xDel");
        storage
            .append(&owner, &ContractRecord::new(ContractKind::Token, "0x1"))
            .unwrap();

        // when
        storage.delete(&owner).unwrap();
        storage.delete(&owner).unwrap();

        // then
        assert!(storage.read(&owner).unwrap().is_empty());
    }

    fn recased(raw: &str, mask: &[bool]) -> String {
        raw.chars()
            .zip(mask.iter().cycle())
            .map(|(c, upper)| {
                if *upper {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn read__any_casing_of_written_wallet__returns_written_records(
            raw in "0x[0-9a-fA-F]{8,40}",
            mask in proptest::collection::vec(any::<bool>(), 1..16),
        ) {
            // given
            let mut storage = InMemoryRegistryStorage::new();
            let written = wallet(&raw);
            let record = ContractRecord::new(ContractKind::VirtualPet, "0xPet");
            storage.append(&written, &record).unwrap();

            // when
            let lookup = wallet(&recased(&raw, &mask));
            let records = storage.read(&lookup).unwrap();

            // then
            prop_assert_eq!(records, vec![record]);
        }
    }
}
