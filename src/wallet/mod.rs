/*
 * Wallet provider integration and connection session
 */

use async_trait::async_trait;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, H256,
};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use crate::models::{ConnectionState, DexError, Result};
use crate::rpc::{ContractReader, RpcClient};

/// An EIP-1193 style wallet: it owns the accounts and signs what it sends.
/// Reads issued through it go to whatever node the wallet is attached to.
#[async_trait]
pub trait WalletProvider: ContractReader {
    async fn request_accounts(&self) -> Result<Vec<Address>>;
    async fn chain_id(&self) -> Result<u64>;
    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256>;
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt>;
}

/// Wallet reached over JSON-RPC (Frame, a local signer node, ...).
pub struct Eip1193Wallet {
    rpc: RpcClient,
}

impl Eip1193Wallet {
    pub fn new(wallet_url: &str) -> Result<Self> {
        Ok(Self {
            rpc: RpcClient::new(wallet_url)?,
        })
    }
}

#[async_trait]
impl ContractReader for Eip1193Wallet {
    async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.rpc.code_at(address).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.rpc.call(to, data).await
    }
}

#[async_trait]
impl WalletProvider for Eip1193Wallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.rpc.request_accounts().await
    }

    async fn chain_id(&self) -> Result<u64> {
        self.rpc.chain_id().await
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256> {
        self.rpc.send_transaction(tx).await
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt> {
        self.rpc.wait_for_receipt(tx_hash).await
    }
}

/// Connection state for the configured wallet. Only [`WalletSession::connect`]
/// moves it; there is no automatic reconnect.
pub struct WalletSession {
    wallet: Option<Arc<dyn WalletProvider>>,
    state: RwLock<ConnectionState>,
}

impl WalletSession {
    #[must_use]
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            wallet,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    #[must_use]
    pub fn wallet(&self) -> Option<Arc<dyn WalletProvider>> {
        self.wallet.clone()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.write().unwrap_or_else(std::sync::PoisonError::into_inner) = next;
    }

    pub async fn connect(&self) -> Result<Address> {
        let wallet = self.wallet.as_ref().ok_or(DexError::WalletNotConnected)?;

        self.set_state(ConnectionState::Connecting);

        let outcome = wallet.request_accounts().await.and_then(|accounts| {
            accounts
                .first()
                .copied()
                .ok_or(DexError::WalletNotConnected)
        });

        match outcome {
            Ok(account) => {
                info!(?account, "Wallet connected");
                self.set_state(ConnectionState::Connected(account));
                Ok(account)
            }
            Err(e) => {
                warn!("Wallet connection failed: {}", e);
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }
}
