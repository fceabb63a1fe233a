/*
 * Reserve reader: provider selection, existence check and paired reserve reads
 */

pub mod history;

use chrono::Utc;
use ethers::types::Address;
use std::sync::Arc;
use tracing::{debug, info};
use crate::{
    dex,
    models::{DexError, ReserveSample, Result},
    rpc::ContractReader,
    utils::{format_units_3dp, parse_address},
};

pub use history::{ChartDomain, ReserveHistory};

pub struct ReserveReader {
    address: Option<String>,
    dedicated: Option<Arc<dyn ContractReader>>,
    injected: Option<Arc<dyn ContractReader>>,
}

impl ReserveReader {
    /// `dedicated` is the configured read endpoint; `injected` is the wallet,
    /// used only when no dedicated endpoint exists.
    #[must_use]
    pub fn new(
        address: Option<String>,
        dedicated: Option<Arc<dyn ContractReader>>,
        injected: Option<Arc<dyn ContractReader>>,
    ) -> Self {
        Self {
            address,
            dedicated,
            injected,
        }
    }

    fn target(&self) -> Result<Address> {
        let raw = self.address.as_deref().ok_or(DexError::ContractNotConfigured)?;
        parse_address(raw)
    }

    fn provider(&self) -> Result<Arc<dyn ContractReader>> {
        self.dedicated
            .clone()
            .or_else(|| self.injected.clone())
            .ok_or(DexError::NoProviderAvailable)
    }

    pub async fn fetch(&self) -> Result<ReserveSample> {
        let target = self.target()?;
        let provider = self.provider()?;

        let code = provider.code_at(target).await?;
        if code.is_empty() {
            return Err(DexError::ContractNotDeployed(format!("{target:?}")));
        }

        let (eth_output, token_output) = tokio::try_join!(
            provider.call(target, dex::reserve_eth_call()),
            provider.call(target, dex::reserve_token_call()),
        )?;

        let raw_eth = dex::decode_uint256(&eth_output)?;
        let raw_token = dex::decode_uint256(&token_output)?;
        debug!(%raw_eth, %raw_token, "Raw reserves");

        let sample = ReserveSample {
            timestamp: Utc::now(),
            reserve_eth: format_units_3dp(raw_eth)?,
            reserve_token: format_units_3dp(raw_token)?,
            raw_eth,
            raw_token,
        };

        info!(
            "Reserves: {} ETH / {} TKN",
            sample.reserve_eth, sample.reserve_token
        );

        Ok(sample)
    }
}
