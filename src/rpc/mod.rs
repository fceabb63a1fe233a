/*
 * RPC client module for reading the DEX contract and talking to the wallet endpoint
 */

pub mod classify;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, PendingTransaction, Provider};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, H256,
};
use std::sync::Arc;
use tracing::debug;
use crate::models::{DexError, Result};

pub use classify::{classify_read_error, classify_wallet_error};

/// Read-only view of the chain, as far as the DEX needs it. Implementations
/// return errors already classified into the [`DexError`] taxonomy.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn code_at(&self, address: Address) -> Result<Bytes>;
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;
}

pub struct RpcClient {
    provider: Arc<Provider<Http>>,
    url: String,
}

impl RpcClient {
    /// Builds the HTTP transport only; nothing is sent until the first request.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| DexError::RpcError(format!("Failed to create provider: {e}")))?;

        Ok(Self {
            provider: Arc::new(provider),
            url: rpc_url.to_string(),
        })
    }

    #[must_use]
    pub fn provider(&self) -> Arc<Provider<Http>> {
        self.provider.clone()
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let chain = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| classify_read_error(&e))?;

        Ok(chain.as_u64())
    }

    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.provider
            .request::<_, Vec<Address>>("eth_requestAccounts", Vec::<String>::new())
            .await
            .map_err(|e| classify_wallet_error(&e))
    }

    pub async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256> {
        let pending = self
            .provider
            .send_transaction(tx, None)
            .await
            .map_err(|e| classify_wallet_error(&e))?;

        Ok(pending.tx_hash())
    }

    pub async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt> {
        PendingTransaction::new(tx_hash, self.provider.as_ref())
            .await
            .map_err(|e| classify_wallet_error(&e))?
            .ok_or_else(|| {
                DexError::TransactionFailed(format!("transaction {tx_hash:?} was dropped"))
            })
    }
}

#[async_trait]
impl ContractReader for RpcClient {
    async fn code_at(&self, address: Address) -> Result<Bytes> {
        debug!(url = %self.url, ?address, "eth_getCode");
        self.provider
            .get_code(address, None)
            .await
            .map_err(|e| classify_read_error(&e))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx = ethers::types::TransactionRequest::new().to(to).data(data);

        self.provider
            .call(&tx.into(), None)
            .await
            .map_err(|e| classify_read_error(&e))
    }
}
