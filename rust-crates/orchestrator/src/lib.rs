pub mod cache;
pub mod config;
pub mod deployment;
pub mod discovery;
pub mod error;
pub mod registry_client;
pub mod session;
pub mod signer;

pub use cache::AddressCache;
pub use config::OrchestratorConfig;
pub use deployment::{
    DeploymentReport,
    DeploymentStage,
};
pub use discovery::{
    ChildDiscovery,
    RecordedAddress,
};
pub use error::{
    DeployError,
    RegistryError,
};
pub use registry_client::{
    HttpRegistryClient,
    RegistryApi,
};
pub use session::{
    Session,
    SyncOutcome,
};
pub use signer::{
    ChainError,
    ChainSigner,
    PendingTx,
};
