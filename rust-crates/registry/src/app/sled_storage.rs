// Sled-backed registry storage.
use crate::app::registry_storage::{
    RawRegistry,
    RegistryStorage,
    decode_registry,
    encode_record,
    known_records,
};
use anyhow::{
    Context,
    anyhow,
};
use deployments::{
    ContractRecord,
    WalletIdentity,
};
use sled::{
    Config,
    Db,
    Tree,
};
use std::path::Path;

const REGISTRIES_TREE: &str = "registries";

#[derive(Clone)]
pub struct SledRegistryStorage {
    tree: Tree,
}

impl SledRegistryStorage {
    pub fn new(db: &Db) -> crate::Result<Self> {
        let tree = db
            .open_tree(REGISTRIES_TREE)
            .context("open registries tree")?;
        Ok(Self { tree })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let config = Config::default().path(path);
        let db = config.open().context("open sled database")?;
        Self::new(&db)
    }
}

impl RegistryStorage for SledRegistryStorage {
    fn wallets(&self) -> crate::Result<Vec<String>> {
        let mut wallets = Vec::new();
        for key in self.tree.iter().keys() {
            let key = key.context("iterate registry keys")?;
            let wallet = std::str::from_utf8(key.as_ref())
                .context("registry key is not valid UTF-8")?;
            wallets.push(wallet.to_string());
        }
        Ok(wallets)
    }

    fn read_exact(&self, wallet: &str) -> crate::Result<Option<Vec<ContractRecord>>> {
        let value = match self.tree.get(wallet.as_bytes())? {
            Some(value) => value,
            None => return Ok(None),
        };
        let entries = deserialize(value.as_ref())?;
        Ok(Some(known_records(wallet, entries)))
    }

    fn append(
        &mut self,
        wallet: &WalletIdentity,
        record: &ContractRecord,
    ) -> crate::Result<()> {
        // the closure may run more than once if the key is contended
        let mut failure = None;
        self.tree
            .fetch_and_update(wallet.as_str().as_bytes(), |existing| {
                failure = None;
                let mut entries = match existing.map(deserialize).transpose() {
                    Ok(entries) => entries.unwrap_or_default(),
                    Err(e) => {
                        failure = Some(e);
                        return existing.map(<[u8]>::to_vec);
                    }
                };
                match encode_record(record) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => {
                        failure = Some(e);
                        return existing.map(<[u8]>::to_vec);
                    }
                }
                match serde_json::to_vec(&entries) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        failure = Some(anyhow!(e).context("serialize registry record"));
                        existing.map(<[u8]>::to_vec)
                    }
                }
            })
            .context("append registry record")?;
        if let Some(e) = failure {
            return Err(e);
        }
        self.tree.flush().context("flush registries")?;
        Ok(())
    }

    fn delete(&mut self, wallet: &WalletIdentity) -> crate::Result<()> {
        self.tree
            .remove(wallet.as_str().as_bytes())
            .context("remove registry")?;
        self.tree.flush().context("flush registries")?;
        Ok(())
    }
}

fn deserialize(bytes: &[u8]) -> crate::Result<RawRegistry> {
    decode_registry(bytes).context("deserialize sled registry")
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use deployments::ContractKind;
    use tempdir::TempDir;

    fn sled_db(temp_dir: &TempDir) -> sled::Db {
        sled::Config::default()
            .path(temp_dir.path())
            .open()
            .expect("open sled db")
    }

    fn wallet(raw: &str) -> WalletIdentity {
        WalletIdentity::parse(raw).unwrap()
    }

    #[test]
    fn sut__when_appending_then_order_is_preserved() {
        // given
        let temp_dir = TempDir::new("sled_registry_append").unwrap();
        let db = sled_db(&temp_dir);
        let mut storage = SledRegistryStorage::new(&db).unwrap();
        let owner = wallet("0xOwner");
        let records = vec![
            ContractRecord::new(ContractKind::ContractManager, "0xM"),
            ContractRecord::new(ContractKind::Token, "0xA"),
            ContractRecord::new(ContractKind::Token, "0xE"),
        ];

        // when
        for record in &records {
            storage.append(&owner, record).unwrap();
        }

        // then
        assert_eq!(storage.read(&owner).unwrap(), records);
    }

    #[test]
    fn sut__when_reopened_then_registries_survive() {
        // given
        let temp_dir = TempDir::new("sled_registry_reopen").unwrap();
        let owner = wallet("0xPersist");
        let record = ContractRecord::new(ContractKind::OmonStaking, "0xS");
        {
            let db = sled_db(&temp_dir);
            let mut storage = SledRegistryStorage::new(&db).unwrap();
            storage.append(&owner, &record).unwrap();
        }

        // when
        let db = sled_db(&temp_dir);
        let storage = SledRegistryStorage::new(&db).unwrap();

        // then
        assert_eq!(storage.read(&owner).unwrap(), vec![record]);
    }

    #[test]
    fn read__other_casing__falls_back_to_stored_key() {
        // given
        let temp_dir = TempDir::new("sled_registry_casing").unwrap();
        let db = sled_db(&temp_dir);
        let mut storage = SledRegistryStorage::new(&db).unwrap();
        let record = ContractRecord::new(ContractKind::Nft, "0xB");
        storage.append(&wallet("0xABCDEF"), &record).unwrap();

        // when
        let records = storage.read(&wallet("0xabcdef")).unwrap();

        // then
        assert_eq!(records, vec![record]);
        assert!(storage.read_exact("0xabcdef").unwrap().is_none());
    }

    #[test]
    fn append__corrupt_value__fails_and_leaves_value_untouched() {
        // given
        let temp_dir = TempDir::new("sled_registry_corrupt").unwrap();
        let db = sled_db(&temp_dir);
        let mut storage = SledRegistryStorage::new(&db).unwrap();
        storage.tree.insert("0xBad", b"not json".as_slice()).unwrap();

        // when
        let result = storage.append(
            &wallet("0xBad"),
            &ContractRecord::new(ContractKind::Token, "0xA"),
        );

        // then
        assert!(result.is_err());
        let raw = storage.tree.get("0xBad").unwrap().unwrap();
        assert_eq!(raw.as_ref(), b"not json");
    }

    #[test]
    fn sut__when_value_holds_unrecognized_entry_then_known_records_survive() {
        // given
        let temp_dir = TempDir::new("sled_registry_mixed").unwrap();
        let db = sled_db(&temp_dir);
        let mut storage = SledRegistryStorage::new(&db).unwrap();
        let mixed = serde_json::json!([
            { "contractType": "Token", "address": "0xA" },
            { "contractType": "Lottery", "address": "0xL" },
        ]);
        storage
            .tree
            .insert("0xOld", serde_json::to_vec(&mixed).unwrap())
            .unwrap();

        // when
        storage
            .append(&wallet("0xOld"), &ContractRecord::new(ContractKind::Nft, "0xB"))
            .unwrap();

        // then
        assert_eq!(
            storage.read(&wallet("0xOld")).unwrap(),
            vec![
                ContractRecord::new(ContractKind::Token, "0xA"),
                ContractRecord::new(ContractKind::Nft, "0xB"),
            ]
        );
        let raw: serde_json::Value =
            serde_json::from_slice(&storage.tree.get("0xOld").unwrap().unwrap()).unwrap();
        assert_eq!(raw[1]["contractType"], "Lottery");
    }

    #[test]
    fn delete__is_idempotent() {
        // given
        let temp_dir = TempDir::new("sled_registry_delete").unwrap();
        let db = sled_db(&temp_dir);
        let mut storage = SledRegistryStorage::new(&db).unwrap();
        let owner = wallet("0xGone");
        storage
            .append(&owner, &ContractRecord::new(ContractKind::VirtualPet, "0xP"))
            .unwrap();

        // when
        storage.delete(&owner).unwrap();
        storage.delete(&owner).unwrap();

        // then
        assert!(storage.read(&owner).unwrap().is_empty());
        assert!(storage.wallets().unwrap().is_empty());
    }
}
