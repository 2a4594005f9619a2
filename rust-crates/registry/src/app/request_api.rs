use deployments::{
    ContractRecord,
    WalletIdentity,
};
use tokio::sync::oneshot;

pub type Responder<T> = oneshot::Sender<crate::Result<T>>;

pub trait RequestAPI {
    fn next_request(&mut self) -> impl Future<Output = crate::Result<Request>>;
}

#[derive(Debug)]
pub enum Request {
    ListContracts(ListContractsRequest),
    SaveContract(SaveContractRequest),
    DeleteContracts(DeleteContractsRequest),
}

impl Request {
    pub fn list_contracts(
        wallet: WalletIdentity,
        sender: Responder<Vec<ContractRecord>>,
    ) -> Self {
        Self::ListContracts(ListContractsRequest { wallet, sender })
    }

    pub fn save_contract(
        wallet: WalletIdentity,
        record: ContractRecord,
        sender: Responder<()>,
    ) -> Self {
        Self::SaveContract(SaveContractRequest {
            wallet,
            record,
            sender,
        })
    }

    pub fn delete_contracts(wallet: WalletIdentity, sender: Responder<()>) -> Self {
        Self::DeleteContracts(DeleteContractsRequest { wallet, sender })
    }
}

#[derive(Debug)]
pub struct ListContractsRequest {
    pub wallet: WalletIdentity,
    pub sender: Responder<Vec<ContractRecord>>,
}

#[derive(Debug)]
pub struct SaveContractRequest {
    pub wallet: WalletIdentity,
    pub record: ContractRecord,
    pub sender: Responder<()>,
}

#[derive(Debug)]
pub struct DeleteContractsRequest {
    pub wallet: WalletIdentity,
    pub sender: Responder<()>,
}
