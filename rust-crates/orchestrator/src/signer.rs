use deployments::{
    ContractArtifact,
    ManagerQuery,
    WalletIdentity,
};
use std::time::Duration;

/// Submitted but not yet finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_id: String,
}

impl PendingTx {
    pub fn new(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("rejected by signer: {0}")]
    Rejected(String),
    #[error("reverted: {0}")]
    Reverted(String),
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Wallet session provider: account source, transaction signer and read-only
/// contract calls.
pub trait ChainSigner {
    fn current_identity(&self) -> Option<WalletIdentity>;

    fn deploy_contract(
        &self,
        artifact: &ContractArtifact,
    ) -> impl Future<Output = Result<PendingTx, ChainError>>;

    /// Resolves with the deployed contract address once the transaction is final.
    fn await_finalization(
        &self,
        tx: &PendingTx,
    ) -> impl Future<Output = Result<String, ChainError>>;

    fn call_read(
        &self,
        contract: &str,
        query: ManagerQuery,
    ) -> impl Future<Output = Result<String, ChainError>>;
}

/// Await a chain call for at most `limit`; expiry becomes [`ChainError::Timeout`].
pub async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, ChainError>>,
) -> Result<T, ChainError> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ChainError::Timeout(limit)))
}
