use std::time::Duration;

pub const DEFAULT_FINALIZATION_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// how long the signer may take to accept or reject a deployment
    pub submission_timeout: Duration,
    /// upper bound on waiting for a deployment transaction to finalize
    pub finalization_timeout: Duration,
    /// bound on each read-only contract call
    pub query_timeout: Duration,
    /// per-request timeout for registry HTTP calls
    pub request_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
            finalization_timeout: DEFAULT_FINALIZATION_TIMEOUT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_finalization_timeout(mut self, timeout: Duration) -> Self {
        self.finalization_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
