use crate::contract::ContractKind;
use anyhow::{
    Context,
    Result,
    anyhow,
};
use sha2::{
    Digest,
    Sha256,
};
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
};

const ABI_SUFFIX: &str = ".abi.json";
const BYTECODE_SUFFIX: &str = ".bin";

/// ABI and creation bytecode for a single contract role.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractArtifact {
    pub kind: ContractKind,
    pub abi: serde_json::Value,
    pub bytecode: Vec<u8>,
}

impl ContractArtifact {
    pub fn new(kind: ContractKind, abi: serde_json::Value, bytecode: Vec<u8>) -> Self {
        Self {
            kind,
            abi,
            bytecode,
        }
    }

    pub fn bytecode_hash(&self) -> String {
        compute_bytecode_hash(&self.bytecode)
    }

    fn load(dir: &Path, kind: ContractKind) -> Result<Option<Self>> {
        let abi_path = dir.join(format!("{}{ABI_SUFFIX}", kind.name()));
        let bin_path = dir.join(format!("{}{BYTECODE_SUFFIX}", kind.name()));
        match (abi_path.exists(), bin_path.exists()) {
            (false, false) => return Ok(None),
            (true, false) => {
                return Err(anyhow!(
                    "ABI for {kind} found but bytecode is missing: {}",
                    bin_path.display()
                ));
            }
            (false, true) => {
                return Err(anyhow!(
                    "bytecode for {kind} found but ABI is missing: {}",
                    abi_path.display()
                ));
            }
            (true, true) => {}
        }

        let abi_bytes = fs::read(&abi_path)
            .with_context(|| format!("Failed to read ABI: {}", abi_path.display()))?;
        let abi = serde_json::from_slice(&abi_bytes)
            .with_context(|| format!("Failed to parse ABI JSON: {}", abi_path.display()))?;
        let raw_bytecode = fs::read_to_string(&bin_path).with_context(|| {
            format!("Failed to read bytecode: {}", bin_path.display())
        })?;
        let bytecode = decode_bytecode(&raw_bytecode)
            .with_context(|| format!("Failed to decode bytecode: {}", bin_path.display()))?;
        Ok(Some(Self::new(kind, abi, bytecode)))
    }
}

/// Artifacts keyed by role. Only the roles present on disk are loaded.
#[derive(Clone, Debug, Default)]
pub struct ArtifactCatalog {
    artifacts: BTreeMap<ContractKind, ContractArtifact>,
}

impl ArtifactCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<Kind>.abi.json` + `<Kind>.bin` pair found in `dir`.
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(anyhow!(
                "artifact directory does not exist: {}",
                dir.display()
            ));
        }
        let mut catalog = Self::new();
        for kind in ContractKind::ALL {
            if let Some(artifact) = ContractArtifact::load(dir, kind)? {
                catalog.insert(artifact);
            }
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, artifact: ContractArtifact) {
        self.artifacts.insert(artifact.kind, artifact);
    }

    pub fn get(&self, kind: ContractKind) -> Option<&ContractArtifact> {
        self.artifacts.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContractArtifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

pub fn compute_bytecode_hash(bytecode: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytecode);
    format!("{:x}", hasher.finalize())
}

fn decode_bytecode(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    let cleaned = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if cleaned.is_empty() {
        return Err(anyhow!("bytecode is empty"));
    }
    hex::decode(cleaned).context("bytecode is not valid hex")
}
