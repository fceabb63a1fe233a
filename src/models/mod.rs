/*
 * Data models and types for the Simple DEX console
 */

use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, U256};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// One successful reserve poll. Display fields are rounded to three
/// fractional digits; the raw fields keep the on-chain integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReserveSample {
    pub timestamp: DateTime<Utc>,
    pub reserve_eth: Decimal,
    pub reserve_token: Decimal,
    #[serde(skip)]
    pub raw_eth: U256,
    #[serde(skip)]
    pub raw_token: U256,
}

impl ReserveSample {
    #[must_use]
    pub fn label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub input_amount: Decimal,
    pub slippage_bps: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub input_wei: U256,
    pub estimated_output: U256,
    pub min_output: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    pub tx_hash: H256,
    pub amount_in_wei: U256,
    pub min_output: Option<U256>,
    pub deadline: Option<u64>,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", content = "account", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Address),
}

impl ConnectionState {
    #[must_use]
    pub fn account(&self) -> Option<Address> {
        match self {
            ConnectionState::Connected(account) => Some(*account),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexError {
    #[error("Configured DEX address is invalid: {0}")]
    InvalidAddress(String),

    #[error("No RPC endpoint or wallet provider is available")]
    NoProviderAvailable,

    #[error("No contract deployed at {0}")]
    ContractNotDeployed(String),

    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("Contract call reverted: {0}")]
    ContractCallReverted(String),

    #[error("Contract returned empty data")]
    EmptyResponseData,

    #[error("Failed to read reserves: {0}")]
    UnknownReadFailure(String),

    #[error("Enter an ETH amount greater than 0")]
    InvalidAmount,

    #[error("Provide a slippage tolerance between 0 and 99.99%")]
    InvalidSlippage,

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("DEX address not configured. Set DEX_ADDRESS")]
    ContractNotConfigured,

    #[error("Switch the wallet to chain {expected} before swapping (connected to {actual})")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("Pool currently cannot fulfill this swap (insufficient liquidity)")]
    InsufficientLiquidity,

    #[error("Slippage tolerance too high for this swap size")]
    SlippageTooHigh,

    #[error("Transaction rejected in wallet")]
    UserRejected,

    #[error("The configured swap interface does not expose a quote function")]
    QuoteUnavailable,

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, DexError>;
