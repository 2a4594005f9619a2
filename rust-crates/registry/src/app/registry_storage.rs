use anyhow::Context;
use deployments::{
    ContractRecord,
    WalletIdentity,
};
use serde_json::Value;

/// Registry entries as persisted. Entries are kept as raw JSON so ones this
/// build does not recognise survive later appends.
pub type RawRegistry = Vec<Value>;

pub trait RegistryStorage {
    /// all wallet keys currently stored, in the casing they were written with
    fn wallets(&self) -> crate::Result<Vec<String>>;

    /// registry stored under exactly this key, if any
    fn read_exact(&self, wallet: &str) -> crate::Result<Option<Vec<ContractRecord>>>;

    /// append a record to the registry stored under the exact wallet key,
    /// creating the registry if needed
    fn append(
        &mut self,
        wallet: &WalletIdentity,
        record: &ContractRecord,
    ) -> crate::Result<()>;

    /// remove the registry stored under the exact wallet key; absent keys are not an error
    fn delete(&mut self, wallet: &WalletIdentity) -> crate::Result<()>;

    /// Registry for `wallet`, falling back to the first stored key that matches
    /// ignoring ASCII case. Unknown wallets yield an empty registry.
    ///
    /// The fallback walks every stored key, so its cost grows with the number of
    /// wallets ever written.
    fn read(&self, wallet: &WalletIdentity) -> crate::Result<Vec<ContractRecord>> {
        if let Some(records) = self.read_exact(wallet.as_str())? {
            return Ok(records);
        }
        tracing::debug!("no exact registry match for {wallet}, scanning stored wallets");
        for stored in self.wallets()? {
            if !wallet.matches(&stored) {
                continue;
            }
            if let Some(records) = self.read_exact(&stored)? {
                tracing::debug!("found registry for {wallet} stored as {stored}");
                return Ok(records);
            }
        }
        Ok(Vec::new())
    }
}

/// Parse a persisted registry. Blank input is an empty registry.
pub fn decode_registry(bytes: &[u8]) -> crate::Result<RawRegistry> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).context("registry is not a JSON array")
}

pub fn encode_record(record: &ContractRecord) -> crate::Result<Value> {
    serde_json::to_value(record).context("serialize registry record")
}

/// Records that parse as known contracts, in stored order. Anything else is
/// skipped with a warning.
pub fn known_records(wallet: &str, entries: RawRegistry) -> Vec<ContractRecord> {
    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ContractRecord>(entry.clone()) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("skipping unrecognized entry for {wallet}: {entry} ({e})"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use deployments::ContractKind;
    use serde_json::json;

    #[test]
    fn known_records__unknown_contract_type__is_skipped_keeping_order() {
        // given
        let entries = vec![
            json!({ "contractType": "Token", "address": "0xA" }),
            json!({ "contractType": "Lottery", "address": "0xL" }),
            json!("garbage"),
            json!({ "contractType": "NFT", "address": "0xB" }),
        ];

        // when
        let records = known_records("0xOld", entries);

        // then
        assert_eq!(
            records,
            vec![
                ContractRecord::new(ContractKind::Token, "0xA"),
                ContractRecord::new(ContractKind::Nft, "0xB"),
            ]
        );
    }

    #[test]
    fn decode_registry__blank_or_array__decodes_and_other_shapes_fail() {
        assert!(decode_registry(b" \n").unwrap().is_empty());
        assert_eq!(decode_registry(b"[1, 2]").unwrap().len(), 2);
        assert!(decode_registry(b"{\"a\": 1}").is_err());
        assert!(decode_registry(b"not json").is_err());
    }
}
