use crate::error::RegistryError;
use anyhow::{
    Context,
    anyhow,
};
use deployments::{
    ContractRecord,
    WalletIdentity,
};
use reqwest::{
    Response,
    StatusCode,
};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Registry service operations used by the orchestrator.
pub trait RegistryApi {
    fn fetch_contracts(
        &self,
        wallet: &WalletIdentity,
    ) -> impl Future<Output = Result<Vec<ContractRecord>, RegistryError>>;

    fn save_contract(
        &self,
        wallet: &WalletIdentity,
        record: &ContractRecord,
    ) -> impl Future<Output = Result<(), RegistryError>>;

    fn delete_contracts(
        &self,
        wallet: &WalletIdentity,
    ) -> impl Future<Output = Result<(), RegistryError>>;
}

#[derive(Clone)]
pub struct HttpRegistryClient {
    base_url: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveContractDto<'a> {
    wallet: &'a str,
    contract_type: &'a str,
    address: &'a str,
}

impl HttpRegistryClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url)
            .with_context(|| format!("invalid registry URL '{base_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("registry URL must be http(s): {base_url}"));
        }
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client for registry")?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn contracts_url(&self, wallet: &WalletIdentity) -> String {
        format!("{}/contracts/{}", self.base_url, wallet)
    }

    async fn ensure_success(
        res: Response,
        action: &str,
    ) -> Result<Response, RegistryError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res
            .text()
            .await
            .unwrap_or_else(|_| "<unavailable body>".to_string());
        let detail = format!("registry responded with {status} when {action}: {body}");
        Err(match status {
            s if s == StatusCode::BAD_REQUEST => RegistryError::BadRequest(detail),
            s if s.is_server_error() => RegistryError::StorageFailure(detail),
            _ => RegistryError::InvalidResponse(detail),
        })
    }
}

fn unreachable_error(action: &str, err: reqwest::Error) -> RegistryError {
    RegistryError::Unreachable(format!("{action}: {err}"))
}

impl RegistryApi for HttpRegistryClient {
    async fn fetch_contracts(
        &self,
        wallet: &WalletIdentity,
    ) -> Result<Vec<ContractRecord>, RegistryError> {
        let action = "fetching contracts";
        let res = self
            .http
            .get(self.contracts_url(wallet))
            .send()
            .await
            .map_err(|e| unreachable_error(action, e))?;
        let res = Self::ensure_success(res, action).await?;
        let entries: Vec<serde_json::Value> = res
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(format!("{action}: {e}")))?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<ContractRecord>(entry.clone()) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("skipping unrecognized registry entry {entry}: {e}")
                }
            }
        }
        Ok(records)
    }

    async fn save_contract(
        &self,
        wallet: &WalletIdentity,
        record: &ContractRecord,
    ) -> Result<(), RegistryError> {
        let action = "saving contract";
        let body = SaveContractDto {
            wallet: wallet.as_str(),
            contract_type: record.contract_type.name(),
            address: &record.address,
        };
        let res = self
            .http
            .post(format!("{}/contracts", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| unreachable_error(action, e))?;
        Self::ensure_success(res, action).await?;
        Ok(())
    }

    async fn delete_contracts(&self, wallet: &WalletIdentity) -> Result<(), RegistryError> {
        let action = "deleting contracts";
        let res = self
            .http
            .delete(self.contracts_url(wallet))
            .send()
            .await
            .map_err(|e| unreachable_error(action, e))?;
        Self::ensure_success(res, action).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn new__trims_trailing_slash() {
        let client =
            HttpRegistryClient::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();

        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn new__rejects_non_http_urls() {
        assert!(HttpRegistryClient::new("ftp://host", Duration::from_secs(1)).is_err());
        assert!(HttpRegistryClient::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn fetch_contracts__unreachable_server__is_unreachable_error() {
        // given
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let client = HttpRegistryClient::new(
            &format!("http://127.0.0.1:{port}"),
            Duration::from_secs(2),
        )
        .unwrap();
        let wallet = WalletIdentity::parse("0xOwner").unwrap();

        // when
        let result = client.fetch_contracts(&wallet).await;

        // then
        assert!(matches!(result, Err(RegistryError::Unreachable(_))));
    }
}
