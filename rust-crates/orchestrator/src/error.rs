use crate::signer::ChainError;
use deployments::ContractKind;
use std::time::Duration;

/// Reasons a deployment stops before anything is recorded.
///
/// On-chain actions are irreversible, so none of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    #[error("no wallet connected")]
    NotConnected,
    #[error("no artifact loaded for {0}")]
    MissingArtifact(ContractKind),
    #[error("signer rejected the transaction: {0}")]
    SignerRejected(String),
    #[error("transaction reverted: {0}")]
    ChainReverted(String),
    #[error("chain did not respond within {0:?}")]
    ChainTimeout(Duration),
}

impl From<ChainError> for DeployError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::Rejected(reason) => DeployError::SignerRejected(reason),
            ChainError::Reverted(reason) => DeployError::ChainReverted(reason),
            ChainError::Timeout(waited) => DeployError::ChainTimeout(waited),
        }
    }
}

/// Failures talking to the registry service.
///
/// After a deployment these are warnings: the contract is live on-chain and only
/// the durable copy of its address is missing until the next resync.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("registry unreachable: {0}")]
    Unreachable(String),
    #[error("registry rejected the payload: {0}")]
    BadRequest(String),
    #[error("registry storage failure: {0}")]
    StorageFailure(String),
    #[error("unexpected registry response: {0}")]
    InvalidResponse(String),
}
