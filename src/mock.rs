/*
 * In-memory chain and wallet doubles for unit tests
 */

use async_trait::async_trait;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, H256, U256, U64,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use crate::dex;
use crate::models::{DexError, Result};
use crate::rpc::ContractReader;
use crate::wallet::WalletProvider;

pub const POOL_ADDRESS: &str = "0x1d61EE6cc145A68Da54Ced80F6956498bcCaCF02";

fn word(value: U256) -> Bytes {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    Bytes::from(out.to_vec())
}

/// Answers `eth_getCode` and `eth_call` by function selector.
pub struct MockReader {
    code: Mutex<Result<Bytes>>,
    responses: Mutex<HashMap<[u8; 4], Result<Bytes>>>,
    calls: AtomicUsize,
    /// Signalled when a held `eth_getCode` starts waiting.
    pub code_started: Arc<Notify>,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl MockReader {
    pub fn with_pool(reserve_eth: U256, reserve_token: U256) -> Self {
        let reader = Self {
            code: Mutex::new(Ok(Bytes::from(vec![0x60, 0x80, 0x60, 0x40]))),
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            code_started: Arc::new(Notify::new()),
            hold: Mutex::new(None),
        };
        reader.set_response(dex::RESERVE_ETH_SIGNATURE, Ok(word(reserve_eth)));
        reader.set_response(dex::RESERVE_TOKEN_SIGNATURE, Ok(word(reserve_token)));
        reader
    }

    pub fn set_code(&self, code: Result<Bytes>) {
        *self.code.lock().unwrap() = code;
    }

    pub fn set_response(&self, signature: &str, response: Result<Bytes>) {
        self.responses
            .lock()
            .unwrap()
            .insert(dex::selector(signature), response);
    }

    pub fn set_quote(&self, estimated: U256) {
        self.set_response(dex::GET_TOKEN_AMOUNT_SIGNATURE, Ok(word(estimated)));
    }

    pub fn set_reserves(&self, reserve_eth: U256, reserve_token: U256) {
        self.set_response(dex::RESERVE_ETH_SIGNATURE, Ok(word(reserve_eth)));
        self.set_response(dex::RESERVE_TOKEN_SIGNATURE, Ok(word(reserve_token)));
    }

    /// Holds the next `eth_getCode` until the returned handle is notified.
    pub fn hold_next_code(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn code_at(&self, _address: Address) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.hold.lock().unwrap().take();
        if let Some(gate) = gate {
            self.code_started.notify_one();
            gate.notified().await;
        }
        self.code.lock().unwrap().clone()
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key: [u8; 4] = data[..4].try_into().unwrap();
        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(DexError::ContractCallReverted("unknown selector".to_string())))
    }
}

pub struct MockWallet {
    pub account: Address,
    pub tx_hash: H256,
    pub reader: MockReader,
    chain_id: u64,
    reject_accounts: Mutex<bool>,
    send_error: Mutex<Option<DexError>>,
    receipt_status: Mutex<u64>,
    sent: Mutex<Vec<TypedTransaction>>,
    /// Signalled when a send starts; sends then wait on `release` if set.
    pub send_started: Arc<Notify>,
    release: Mutex<Option<Arc<Notify>>>,
}

impl MockWallet {
    pub fn new(chain_id: u64) -> Self {
        Self {
            account: Address::repeat_byte(0xab),
            tx_hash: H256::repeat_byte(0x11),
            reader: MockReader::with_pool(U256::exp10(18), U256::exp10(20)),
            chain_id,
            reject_accounts: Mutex::new(false),
            send_error: Mutex::new(None),
            receipt_status: Mutex::new(1),
            sent: Mutex::new(Vec::new()),
            send_started: Arc::new(Notify::new()),
            release: Mutex::new(None),
        }
    }

    pub fn sepolia() -> Self {
        Self::new(crate::config::SEPOLIA_CHAIN_ID)
    }

    pub fn reject_accounts(&self) {
        *self.reject_accounts.lock().unwrap() = true;
    }

    pub fn fail_send(&self, err: DexError) {
        *self.send_error.lock().unwrap() = Some(err);
    }

    pub fn set_receipt_status(&self, status: u64) {
        *self.receipt_status.lock().unwrap() = status;
    }

    /// Holds every send until the returned handle is notified.
    pub fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.release.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn sent(&self) -> Vec<TypedTransaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractReader for MockWallet {
    async fn code_at(&self, address: Address) -> Result<Bytes> {
        self.reader.code_at(address).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.reader.call(to, data).await
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if *self.reject_accounts.lock().unwrap() {
            return Err(DexError::UserRejected);
        }
        Ok(vec![self.account])
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    async fn send_transaction(&self, tx: TypedTransaction) -> Result<H256> {
        self.send_started.notify_one();
        let gate = self.release.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(err) = self.send_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(tx);
        Ok(self.tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt> {
        Ok(TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(42)),
            status: Some(U64::from(*self.receipt_status.lock().unwrap())),
            ..Default::default()
        })
    }
}
