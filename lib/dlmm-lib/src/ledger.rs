//! Network boundary. Everything that talks to a cluster goes through [`Ledger`].

use async_trait::async_trait;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::{
    client_error::{Error as ClientError, ErrorKind as ClientErrorKind},
    request::RpcError,
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LedgerError {
    #[error("{}", crate::solana::verbose_solana_error(.0))]
    Client(#[from] ClientError),
    /// The cluster refused the transaction, it will not land.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

impl LedgerError {
    /// Whether the transaction was definitely not accepted.
    ///
    /// Transport failures return `false`: the request may have reached the cluster.
    pub fn is_rejection(&self) -> bool {
        match self {
            LedgerError::Rejected(_) => true,
            LedgerError::Unavailable(_) => false,
            LedgerError::Client(err) => matches!(
                err.kind(),
                ClientErrorKind::RpcError(RpcError::RpcResponseError { .. })
                    | ClientErrorKind::TransactionError(_)
                    | ClientErrorKind::SigningError(_)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Landed,
    Failed(String),
    Unknown,
}

#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError>;

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError>;

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, LedgerError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError>;

    async fn signature_status(&self, signature: &Signature)
        -> Result<SignatureStatus, LedgerError>;

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64)
        -> Result<Signature, LedgerError>;
}

/// [`Ledger`] over JSON RPC.
pub struct RpcLedger {
    rpc: RpcClient,
    commitment: CommitmentConfig,
}

impl RpcLedger {
    pub fn new(rpc: RpcClient) -> Self {
        let commitment = rpc.commitment();
        Self { rpc, commitment }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl Ledger for RpcLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError> {
        Ok(self
            .rpc
            .get_account_with_commitment(address, self.commitment)
            .await?
            .value)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self.rpc.get_balance(address).await?)
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        Ok(self.rpc.get_latest_blockhash().await?)
    }

    async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, LedgerError> {
        Ok(self
            .rpc
            .is_blockhash_valid(blockhash, CommitmentConfig::processed())
            .await?)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        Ok(self.rpc.send_transaction(tx).await?)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, LedgerError> {
        let status = self
            .rpc
            .get_signature_status_with_commitment(signature, self.commitment)
            .await?;
        Ok(match status {
            None => SignatureStatus::Unknown,
            Some(Ok(())) => SignatureStatus::Landed,
            Some(Err(err)) => SignatureStatus::Failed(err.to_string()),
        })
    }

    async fn request_airdrop(
        &self,
        address: &Pubkey,
        lamports: u64,
    ) -> Result<Signature, LedgerError> {
        Ok(self.rpc.request_airdrop(address, lamports).await?)
    }
}
