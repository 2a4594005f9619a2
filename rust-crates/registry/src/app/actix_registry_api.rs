use crate::{
    Result,
    app::request_api::{
        Request,
        RequestAPI,
    },
};
use actix_cors::Cors;
use actix_web::{
    App,
    HttpResponse,
    HttpServer,
    dev::ServerHandle,
    error::InternalError,
    web,
};
use anyhow::{
    Context,
    anyhow,
};
use deployments::{
    ContractKind,
    ContractRecord,
    WalletIdentity,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    net::TcpListener,
    thread::JoinHandle,
};
use tokio::sync::{
    mpsc,
    oneshot,
};

pub const HEALTH_MESSAGE: &str = "Registry service is running";
const SERVER_ERROR_MESSAGE: &str = "Server error";
const INVALID_DATA_MESSAGE: &str = "Invalid data";
/// seconds idle keep-alive connections may hold up shutdown
const SHUTDOWN_TIMEOUT_SECS: u64 = 1;

/// Body of `POST /contracts`.
///
/// The flat `{wallet, contractType, address}` shape is canonical. Older
/// clients nest the record as `{wallet, contractData: {contractType, address}}`,
/// which is still accepted.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContractBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_data: Option<LegacyContractData>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyContractData {
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl SaveContractBody {
    #[cfg(test)]
    pub(crate) fn new(
        wallet: &WalletIdentity,
        contract_type: ContractKind,
        address: impl Into<String>,
    ) -> Self {
        Self {
            wallet: Some(wallet.to_string()),
            contract_type: Some(contract_type.name().to_string()),
            address: Some(address.into()),
            contract_data: None,
        }
    }

    fn into_parts(self) -> Result<(WalletIdentity, ContractRecord)> {
        let legacy = self.contract_data.unwrap_or_default();
        let wallet = present(self.wallet).ok_or_else(|| anyhow!("missing wallet"))?;
        let contract_type = present(self.contract_type)
            .or_else(|| present(legacy.contract_type))
            .ok_or_else(|| anyhow!("missing contractType"))?;
        let address = present(self.address)
            .or_else(|| present(legacy.address))
            .ok_or_else(|| anyhow!("missing address"))?;

        let wallet = WalletIdentity::parse(wallet)?;
        let contract_type: ContractKind = contract_type.parse()?;
        Ok((wallet, ContractRecord::new(contract_type, address)))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveContractResponse {
    pub success: bool,
    pub contract_data: ContractRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteContractsResponse {
    pub success: bool,
}

pub struct ActixRegistryApi {
    receiver: mpsc::Receiver<Request>,
    base_url: String,
    server_handle: ServerHandle,
    server_thread: Option<JoinHandle<()>>,
}

impl ActixRegistryApi {
    pub async fn new(host: &str, port: Option<u16>) -> Result<Self> {
        let (sender, receiver) = mpsc::channel(64);

        let listener = TcpListener::bind((host, port.unwrap_or(0)))
            .context("failed to bind HTTP listener for registry API")?;
        let address = listener
            .local_addr()
            .context("failed to read listener address")?;
        let base_url = format!("http://{}", address);

        tracing::info!("registry API listening on {}", base_url);

        let server = HttpServer::new(move || {
            let json_config = web::JsonConfig::default().error_handler(|err, _req| {
                tracing::warn!("rejecting malformed registry payload: {err}");
                InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().body(INVALID_DATA_MESSAGE),
                )
                .into()
            });

            App::new()
                .wrap(Cors::permissive())
                .app_data(web::Data::new(sender.clone()))
                .app_data(json_config)
                .route("/", web::get().to(handle_health))
                .route("/contracts", web::post().to(handle_save_contract))
                .route(
                    "/contracts/{wallet}",
                    web::get().to(handle_list_contracts),
                )
                .route(
                    "/contracts/{wallet}",
                    web::delete().to(handle_delete_contracts),
                )
        })
        .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
        .listen(listener)
        .context("failed to start Actix server")?
        .run();

        let server_handle = server.handle();
        let server_thread = std::thread::spawn(move || {
            let sys = actix_web::rt::System::new();
            let _ = sys.block_on(server);
        });

        Ok(Self {
            receiver,
            base_url,
            server_handle,
            server_thread: Some(server_thread),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl RequestAPI for ActixRegistryApi {
    async fn next_request(&mut self) -> Result<Request> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| anyhow!("registry server closed"))
    }
}

impl Drop for ActixRegistryApi {
    fn drop(&mut self) {
        let _ = self.server_handle.stop(true);
        if let Some(thread) = self.server_thread.take() {
            let _ = thread.join();
        }
    }
}

async fn handle_health() -> &'static str {
    HEALTH_MESSAGE
}

async fn handle_list_contracts(
    sender: web::Data<mpsc::Sender<Request>>,
    wallet: web::Path<String>,
) -> HttpResponse {
    let wallet = match WalletIdentity::parse(wallet.as_str()) {
        Ok(wallet) => wallet,
        Err(e) => return bad_request(e),
    };
    tracing::info!("received contract list request for {wallet}");
    let (response_sender, response_receiver) = oneshot::channel();
    let request = Request::list_contracts(wallet, response_sender);
    match forward(&sender, request, response_receiver).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(response) => response,
    }
}

async fn handle_save_contract(
    sender: web::Data<mpsc::Sender<Request>>,
    body: web::Json<SaveContractBody>,
) -> HttpResponse {
    let (wallet, record) = match body.into_inner().into_parts() {
        Ok(parts) => parts,
        Err(e) => return bad_request(e),
    };
    tracing::info!(
        "received save request for {wallet}: {} at {}",
        record.contract_type,
        record.address
    );
    let (response_sender, response_receiver) = oneshot::channel();
    let request = Request::save_contract(wallet, record.clone(), response_sender);
    match forward(&sender, request, response_receiver).await {
        Ok(()) => HttpResponse::Ok().json(SaveContractResponse {
            success: true,
            contract_data: record,
        }),
        Err(response) => response,
    }
}

async fn handle_delete_contracts(
    sender: web::Data<mpsc::Sender<Request>>,
    wallet: web::Path<String>,
) -> HttpResponse {
    let wallet = match WalletIdentity::parse(wallet.as_str()) {
        Ok(wallet) => wallet,
        Err(e) => return bad_request(e),
    };
    tracing::info!("received delete request for {wallet}");
    let (response_sender, response_receiver) = oneshot::channel();
    let request = Request::delete_contracts(wallet, response_sender);
    match forward(&sender, request, response_receiver).await {
        Ok(()) => HttpResponse::Ok().json(DeleteContractsResponse { success: true }),
        Err(response) => response,
    }
}

async fn forward<T>(
    sender: &mpsc::Sender<Request>,
    request: Request,
    response: oneshot::Receiver<Result<T>>,
) -> Result<T, HttpResponse> {
    sender.send(request).await.map_err(|_| {
        tracing::error!("unable to forward request to registry service");
        server_error()
    })?;
    match response.await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!("registry storage failure: {e:#}");
            Err(server_error())
        }
        Err(_) => {
            tracing::error!("registry responder dropped");
            Err(server_error())
        }
    }
}

fn bad_request(reason: anyhow::Error) -> HttpResponse {
    tracing::warn!("rejecting registry request: {reason:#}");
    HttpResponse::BadRequest().body(INVALID_DATA_MESSAGE)
}

fn server_error() -> HttpResponse {
    HttpResponse::InternalServerError().body(SERVER_ERROR_MESSAGE)
}
