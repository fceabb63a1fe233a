/*
 * Swap quoting, slippage bound and submission
 */

use chrono::Utc;
use ethers::types::{Address, TransactionRequest, U256, U64};
use std::sync::Arc;
use tracing::{info, warn};
use crate::{
    config::{Config, SwapInterface},
    dex::{self, SwapCall},
    models::{DexError, Result, SwapQuote, SwapReceipt, SwapRequest},
    utils::{min_output, parse_address, to_wei, BPS_DENOMINATOR},
    wallet::{WalletProvider, WalletSession},
};

/// How long a submitted swap stays valid on chain.
pub const DEADLINE_SECS: u64 = 300;

#[must_use]
pub fn deadline_from(now_unix: i64) -> u64 {
    u64::try_from(now_unix).unwrap_or_default() + DEADLINE_SECS
}

/// Everything a swap needs once the preconditions hold.
struct Prepared {
    wallet: Arc<dyn WalletProvider>,
    target: Address,
    account: Address,
    input_wei: U256,
}

pub struct SwapQuoter {
    address: Option<String>,
    chain_id: u64,
    interface: SwapInterface,
}

impl SwapQuoter {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            address: config.dex.address.clone(),
            chain_id: config.chain.chain_id,
            interface: config.dex.interface,
        }
    }

    #[must_use]
    pub fn interface(&self) -> SwapInterface {
        self.interface
    }

    fn prepare(&self, session: &WalletSession, request: &SwapRequest) -> Result<Prepared> {
        let wallet = session.wallet().ok_or(DexError::WalletNotConnected)?;
        let raw_address = self.address.as_deref().ok_or(DexError::ContractNotConfigured)?;
        let target = parse_address(raw_address)?;
        let input_wei = to_wei(request.input_amount)?;

        if request.slippage_bps >= BPS_DENOMINATOR {
            return Err(DexError::InvalidSlippage);
        }

        let account = session.state().account().ok_or(DexError::WalletNotConnected)?;

        Ok(Prepared {
            wallet,
            target,
            account,
            input_wei,
        })
    }

    async fn ensure_network(&self, wallet: &dyn WalletProvider) -> Result<()> {
        let actual = wallet.chain_id().await?;
        if actual != self.chain_id {
            warn!(expected = self.chain_id, actual, "Wallet on wrong network");
            return Err(DexError::WrongNetwork {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }

    async fn estimate(&self, prepared: &Prepared, slippage_bps: u32) -> Result<SwapQuote> {
        if self.interface == SwapInterface::Unprotected {
            return Err(DexError::QuoteUnavailable);
        }

        let output = prepared
            .wallet
            .call(prepared.target, dex::get_token_amount_call(prepared.input_wei))
            .await?;
        let estimated_output = dex::decode_uint256(&output)?;

        if estimated_output.is_zero() {
            return Err(DexError::InsufficientLiquidity);
        }

        let min_output = min_output(estimated_output, slippage_bps);
        if min_output.is_zero() {
            return Err(DexError::SlippageTooHigh);
        }

        Ok(SwapQuote {
            input_wei: prepared.input_wei,
            estimated_output,
            min_output,
        })
    }

    pub async fn quote(&self, session: &WalletSession, request: &SwapRequest) -> Result<SwapQuote> {
        let prepared = self.prepare(session, request)?;
        self.ensure_network(prepared.wallet.as_ref()).await?;
        self.estimate(&prepared, request.slippage_bps).await
    }

    /// Runs the whole swap: checks, quote, bound, deadline, submission and
    /// confirmation. Returns once the receipt is in.
    pub async fn submit(&self, session: &WalletSession, request: &SwapRequest) -> Result<SwapReceipt> {
        let prepared = self.prepare(session, request)?;
        self.ensure_network(prepared.wallet.as_ref()).await?;

        let call = match self.interface {
            SwapInterface::Protected => {
                let quote = self.estimate(&prepared, request.slippage_bps).await?;
                info!(
                    estimated = %quote.estimated_output,
                    min = %quote.min_output,
                    "Quoted swap of {} ETH", request.input_amount
                );
                SwapCall::Protected {
                    min_output: quote.min_output,
                    deadline: deadline_from(Utc::now().timestamp()),
                }
            }
            SwapInterface::Unprotected => SwapCall::Unprotected,
        };

        let tx = TransactionRequest::new()
            .from(prepared.account)
            .to(prepared.target)
            .value(prepared.input_wei)
            .data(call.calldata());

        let tx_hash = prepared.wallet.send_transaction(tx.into()).await?;
        info!(?tx_hash, "Swap submitted, waiting for confirmation");

        let receipt = prepared.wallet.wait_for_receipt(tx_hash).await?;
        if receipt.status == Some(U64::zero()) {
            return Err(DexError::TransactionFailed(format!(
                "swap {tx_hash:?} reverted on chain"
            )));
        }

        info!(?tx_hash, "Swap confirmed");

        let (min_output, deadline) = match call {
            SwapCall::Protected { min_output, deadline } => (Some(min_output), Some(deadline)),
            SwapCall::Unprotected => (None, None),
        };

        Ok(SwapReceipt {
            tx_hash,
            amount_in_wei: prepared.input_wei,
            min_output,
            deadline,
            block_number: receipt.block_number.map(|block| block.as_u64()),
        })
    }
}
