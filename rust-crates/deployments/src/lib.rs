pub mod artifact;
pub mod contract;
pub mod wallet;

pub use artifact::{
    ArtifactCatalog,
    ContractArtifact,
    compute_bytecode_hash,
};
pub use contract::{
    ContractKind,
    ContractRecord,
    MANAGER_CHILDREN,
    ManagerQuery,
};
pub use wallet::WalletIdentity;
