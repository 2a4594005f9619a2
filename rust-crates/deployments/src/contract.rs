use anyhow::{
    Result,
    anyhow,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    str::FromStr,
};

/// Every contract role the registry knows about.
///
/// Serialized names are the wire names stored in the registry, so they must not
/// change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractKind {
    ContractManager,
    Token,
    #[serde(rename = "NFT")]
    Nft,
    VotingSystem,
    BatchTransaction,
    VirtualPet,
    RockPaperScissors,
    OmonStaking,
    BettingGame,
    #[serde(rename = "RandomGM")]
    RandomGm,
}

/// Children owned by the manager contract, in the order they are recorded.
pub const MANAGER_CHILDREN: [ContractKind; 4] = [
    ContractKind::Token,
    ContractKind::Nft,
    ContractKind::VotingSystem,
    ContractKind::BatchTransaction,
];

impl ContractKind {
    pub const ALL: [ContractKind; 10] = [
        ContractKind::ContractManager,
        ContractKind::Token,
        ContractKind::Nft,
        ContractKind::VotingSystem,
        ContractKind::BatchTransaction,
        ContractKind::VirtualPet,
        ContractKind::RockPaperScissors,
        ContractKind::OmonStaking,
        ContractKind::BettingGame,
        ContractKind::RandomGm,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContractKind::ContractManager => "ContractManager",
            ContractKind::Token => "Token",
            ContractKind::Nft => "NFT",
            ContractKind::VotingSystem => "VotingSystem",
            ContractKind::BatchTransaction => "BatchTransaction",
            ContractKind::VirtualPet => "VirtualPet",
            ContractKind::RockPaperScissors => "RockPaperScissors",
            ContractKind::OmonStaking => "OmonStaking",
            ContractKind::BettingGame => "BettingGame",
            ContractKind::RandomGm => "RandomGM",
        }
    }

    pub fn is_manager(self) -> bool {
        matches!(self, ContractKind::ContractManager)
    }

    /// Read-only manager call that yields this contract's address, if the
    /// manager deploys it.
    pub fn manager_query(self) -> Option<ManagerQuery> {
        match self {
            ContractKind::Token => Some(ManagerQuery::TokenAddress),
            ContractKind::Nft => Some(ManagerQuery::NftAddress),
            ContractKind::VotingSystem => Some(ManagerQuery::VotingAddress),
            ContractKind::BatchTransaction => Some(ManagerQuery::BatchAddress),
            _ => None,
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ContractKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        ContractKind::ALL
            .into_iter()
            .find(|kind| kind.name() == trimmed)
            .ok_or_else(|| anyhow!("unknown contract type '{trimmed}'"))
    }
}

/// Getter exposed by the manager contract for one of its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagerQuery {
    TokenAddress,
    NftAddress,
    VotingAddress,
    BatchAddress,
}

impl ManagerQuery {
    pub fn method_name(self) -> &'static str {
        match self {
            ManagerQuery::TokenAddress => "getTokenAddress",
            ManagerQuery::NftAddress => "getNFTAddress",
            ManagerQuery::VotingAddress => "getVotingAddress",
            ManagerQuery::BatchAddress => "getBatchAddress",
        }
    }

    pub fn child(self) -> ContractKind {
        match self {
            ManagerQuery::TokenAddress => ContractKind::Token,
            ManagerQuery::NftAddress => ContractKind::Nft,
            ManagerQuery::VotingAddress => ContractKind::VotingSystem,
            ManagerQuery::BatchAddress => ContractKind::BatchTransaction,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub contract_type: ContractKind,
    pub address: String,
}

impl ContractRecord {
    pub fn new(contract_type: ContractKind, address: impl Into<String>) -> Self {
        Self {
            contract_type,
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn from_str__accepts_every_wire_name() {
        for kind in ContractKind::ALL {
            let parsed: ContractKind = kind.name().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("Nft".parse::<ContractKind>().is_err());
        assert!("Lottery".parse::<ContractKind>().is_err());
    }

    #[test]
    fn record__serializes_with_camel_case_and_wire_names() {
        // given
        let record = ContractRecord::new(ContractKind::Nft, "0xB");

        // when
        let json = serde_json::to_value(&record).unwrap();

        // then
        assert_eq!(
            json,
            serde_json::json!({ "contractType": "NFT", "address": "0xB" })
        );
    }

    #[test]
    fn serde_name__matches_display_name() {
        for kind in ContractKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.name().to_string()));
        }
    }

    #[test]
    fn manager_query__covers_exactly_the_manager_children() {
        for kind in ContractKind::ALL {
            let query = kind.manager_query();
            assert_eq!(query.is_some(), MANAGER_CHILDREN.contains(&kind));
            if let Some(query) = query {
                assert_eq!(query.child(), kind);
            }
        }
        assert_eq!(ManagerQuery::NftAddress.method_name(), "getNFTAddress");
    }
}
