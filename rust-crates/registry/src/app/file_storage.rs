// One JSON file per wallet, named by the wallet identity as received.
use crate::app::registry_storage::{
    RawRegistry,
    RegistryStorage,
    decode_registry,
    encode_record,
    known_records,
};
use anyhow::Context;
use deployments::{
    ContractRecord,
    WalletIdentity,
};
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

const REGISTRY_SUFFIX: &str = ".json";
const TEMP_PREFIX: &str = ".";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Clone, Debug)]
pub struct FileRegistryStorage {
    dir: PathBuf,
}

impl FileRegistryStorage {
    pub fn open<P: AsRef<Path>>(dir: P) -> crate::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create registry directory {}", dir.display())
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn registry_path(&self, wallet: &str) -> PathBuf {
        self.dir.join(format!("{wallet}{REGISTRY_SUFFIX}"))
    }

    fn temp_path(&self, wallet: &str) -> PathBuf {
        self.dir
            .join(format!("{TEMP_PREFIX}{wallet}{REGISTRY_SUFFIX}{TEMP_SUFFIX}"))
    }

    fn read_raw(&self, wallet: &str) -> crate::Result<Option<RawRegistry>> {
        let path = self.registry_path(wallet);
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(&path)
            .with_context(|| format!("Failed to read registry {}", path.display()))?;
        let entries = decode_registry(&data)
            .with_context(|| format!("Failed to parse registry {}", path.display()))?;
        Ok(Some(entries))
    }

    fn write_registry(&self, wallet: &str, entries: &RawRegistry) -> crate::Result<()> {
        let json = serde_json::to_vec_pretty(entries)
            .with_context(|| format!("Failed to serialize registry for {wallet}"))?;
        let temp = self.temp_path(wallet);
        fs::write(&temp, json)
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        let target = self.registry_path(wallet);
        fs::rename(&temp, &target)
            .with_context(|| format!("Failed to move registry into {}", target.display()))?;
        Ok(())
    }
}

impl RegistryStorage for FileRegistryStorage {
    fn wallets(&self) -> crate::Result<Vec<String>> {
        let mut wallets = Vec::new();
        for entry in fs::read_dir(&self.dir).context("Failed to read registry directory")? {
            let entry = entry.context("Failed to read registry entry")?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with(TEMP_PREFIX) {
                continue;
            }
            if let Some(wallet) = name.strip_suffix(REGISTRY_SUFFIX) {
                wallets.push(wallet.to_string());
            }
        }
        wallets.sort();
        Ok(wallets)
    }

    fn read_exact(&self, wallet: &str) -> crate::Result<Option<Vec<ContractRecord>>> {
        Ok(self
            .read_raw(wallet)?
            .map(|entries| known_records(wallet, entries)))
    }

    fn append(
        &mut self,
        wallet: &WalletIdentity,
        record: &ContractRecord,
    ) -> crate::Result<()> {
        let mut entries = self.read_raw(wallet.as_str())?.unwrap_or_default();
        entries.push(encode_record(record)?);
        self.write_registry(wallet.as_str(), &entries)
    }

    fn delete(&mut self, wallet: &WalletIdentity) -> crate::Result<()> {
        let path = self.registry_path(wallet.as_str());
        if !path.exists() {
            tracing::debug!("no registry to delete for {wallet}");
            return Ok(());
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to delete registry {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use deployments::ContractKind;
    use tempdir::TempDir;

    fn wallet(raw: &str) -> WalletIdentity {
        WalletIdentity::parse(raw).unwrap()
    }

    #[test]
    fn sut__when_appending_then_file_holds_pretty_json_array() {
        // given
        let temp_dir = TempDir::new("file_registry_append").unwrap();
        let mut storage = FileRegistryStorage::open(temp_dir.path()).unwrap();
        let owner = wallet("0xAbC123");

        // when
        storage
            .append(&owner, &ContractRecord::new(ContractKind::ContractManager, "0xM"))
            .unwrap();
        storage
            .append(&owner, &ContractRecord::new(ContractKind::Token, "0xA"))
            .unwrap();

        // then
        let raw = fs::read_to_string(temp_dir.path().join("0xAbC123.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                { "contractType": "ContractManager", "address": "0xM" },
                { "contractType": "Token", "address": "0xA" },
            ])
        );
        assert!(raw.contains('\n'));
        assert_eq!(storage.wallets().unwrap(), vec!["0xAbC123".to_string()]);
    }

    #[test]
    fn read__unknown_wallet__returns_empty_registry() {
        let temp_dir = TempDir::new("file_registry_unknown").unwrap();
        let storage = FileRegistryStorage::open(temp_dir.path()).unwrap();

        assert!(storage.read(&wallet("0xMissing")).unwrap().is_empty());
    }

    #[test]
    fn read__other_casing__falls_back_to_stored_file() {
        // given
        let temp_dir = TempDir::new("file_registry_casing").unwrap();
        let mut storage = FileRegistryStorage::open(temp_dir.path()).unwrap();
        let checksummed = wallet("0xAbCdEf");
        let record = ContractRecord::new(ContractKind::BettingGame, "0xBet");
        storage.append(&checksummed, &record).unwrap();

        // when
        let records = storage.read(&wallet("0xabcdef")).unwrap();

        // then
        assert_eq!(records, vec![record]);
    }

    #[test]
    fn read__ignores_unrelated_files_and_temp_files() {
        // given
        let temp_dir = TempDir::new("file_registry_noise").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(temp_dir.path().join(".0xabc.json.tmp"), "[").unwrap();
        let storage = FileRegistryStorage::open(temp_dir.path()).unwrap();

        // when
        let wallets = storage.wallets().unwrap();
        let records = storage.read(&wallet("0xABC")).unwrap();

        // then
        assert!(wallets.is_empty());
        assert!(records.is_empty());
    }

    #[test]
    fn read__empty_file__is_an_empty_registry() {
        let temp_dir = TempDir::new("file_registry_empty").unwrap();
        fs::write(temp_dir.path().join("0xE.json"), "  \n").unwrap();
        let storage = FileRegistryStorage::open(temp_dir.path()).unwrap();

        assert_eq!(storage.read_exact("0xE").unwrap(), Some(Vec::new()));
    }

    #[test]
    fn read__unrecognized_entry__keeps_known_records() {
        // given
        let temp_dir = TempDir::new("file_registry_mixed").unwrap();
        let mixed = serde_json::json!([
            { "contractType": "Token", "address": "0xA" },
            { "contractType": "Lottery", "address": "0xL" },
        ]);
        fs::write(temp_dir.path().join("0xOld.json"), mixed.to_string()).unwrap();
        let storage = FileRegistryStorage::open(temp_dir.path()).unwrap();

        // when
        let records = storage.read(&wallet("0xOld")).unwrap();

        // then
        assert_eq!(records, vec![ContractRecord::new(ContractKind::Token, "0xA")]);
    }

    #[test]
    fn append__unrecognized_entry__is_preserved_in_file() {
        // given
        let temp_dir = TempDir::new("file_registry_mixed_append").unwrap();
        let lottery = serde_json::json!({ "contractType": "Lottery", "address": "0xL" });
        fs::write(
            temp_dir.path().join("0xOld.json"),
            serde_json::json!([lottery.clone()]).to_string(),
        )
        .unwrap();
        let mut storage = FileRegistryStorage::open(temp_dir.path()).unwrap();

        // when
        storage
            .append(&wallet("0xOld"), &ContractRecord::new(ContractKind::Nft, "0xB"))
            .unwrap();

        // then
        let raw = fs::read_to_string(temp_dir.path().join("0xOld.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([lottery, { "contractType": "NFT", "address": "0xB" }])
        );
        assert_eq!(
            storage.read(&wallet("0xOld")).unwrap(),
            vec![ContractRecord::new(ContractKind::Nft, "0xB")]
        );
    }

    #[test]
    fn read__corrupt_file__is_an_error() {
        let temp_dir = TempDir::new("file_registry_corrupt").unwrap();
        fs::write(temp_dir.path().join("0xC.json"), "{not json").unwrap();
        let storage = FileRegistryStorage::open(temp_dir.path()).unwrap();

        assert!(storage.read(&wallet("0xC")).is_err());
    }

    #[test]
    fn delete__removes_file_and_is_idempotent() {
        // given
        let temp_dir = TempDir::new("file_registry_delete").unwrap();
        let mut storage = FileRegistryStorage::open(temp_dir.path()).unwrap();
        let owner = wallet("0xDel");
        storage
            .append(&owner, &ContractRecord::new(ContractKind::RandomGm, "0xR"))
            .unwrap();

        // when
        storage.delete(&owner).unwrap();
        storage.delete(&owner).unwrap();

        // then
        assert!(!temp_dir.path().join("0xDel.json").exists());
        assert!(storage.read(&owner).unwrap().is_empty());
    }

    #[test]
    fn open__creates_missing_directory() {
        let temp_dir = TempDir::new("file_registry_open").unwrap();
        let nested = temp_dir.path().join("data").join("registries");

        let storage = FileRegistryStorage::open(&nested).unwrap();

        assert!(storage.dir().is_dir());
    }
}
