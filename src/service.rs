/*
 * DEX service that owns the wallet session, reserve reader and swap quoter
 */

use chrono::Duration;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::{
    config::Config,
    metrics::DexMetrics,
    models::{ConnectionState, ReserveSample, Result, SwapQuote, SwapReceipt, SwapRequest},
    reserves::{ChartDomain, ReserveHistory, ReserveReader},
    rpc::{ContractReader, RpcClient},
    swap::SwapQuoter,
    wallet::{Eip1193Wallet, WalletProvider, WalletSession},
};

/// Upper bound on the history window (about 136 years).
const MAX_WINDOW_SECS: u64 = u32::MAX as u64;

/// Result of an action guarded against re-entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Completed(T),
    /// Another call of the same kind was still in flight.
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub samples: Vec<ReserveSample>,
    pub labels: Vec<String>,
    pub domain: Option<ChartDomain>,
    pub last_error: Option<String>,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DexService {
    config: Config,
    session: WalletSession,
    reader: ReserveReader,
    quoter: SwapQuoter,
    history: RwLock<ReserveHistory>,
    last_error: RwLock<Option<String>>,
    /// Held for the duration of a reserve fetch.
    reserves_busy: Mutex<()>,
    swap_busy: AtomicBool,
    metrics: DexMetrics,
}

impl DexService {
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing DEX service");

        let dedicated = match config.chain.rpc_url.as_deref() {
            Some(url) => {
                info!("Using dedicated RPC endpoint {}", url);
                Some(Arc::new(RpcClient::new(url)?) as Arc<dyn ContractReader>)
            }
            None => None,
        };

        let wallet = match config.chain.wallet_url.as_deref() {
            Some(url) => {
                info!("Using wallet endpoint {}", url);
                Some(Arc::new(Eip1193Wallet::new(url)?))
            }
            None => None,
        };

        Self::with_providers(config, dedicated, wallet)
    }

    pub fn with_providers<W>(
        config: Config,
        dedicated: Option<Arc<dyn ContractReader>>,
        wallet: Option<Arc<W>>,
    ) -> Result<Self>
    where
        W: WalletProvider + 'static,
    {
        let injected = wallet.clone().map(|w| w as Arc<dyn ContractReader>);
        let session = WalletSession::new(wallet.map(|w| w as Arc<dyn WalletProvider>));

        let reader = ReserveReader::new(config.dex.address.clone(), dedicated, injected);
        let quoter = SwapQuoter::new(&config);
        let history = ReserveHistory::new(
            Duration::seconds(i64::try_from(config.polling.history_window_secs.min(MAX_WINDOW_SECS)).unwrap_or_default()),
            config.polling.history_capacity,
        );

        Ok(Self {
            config,
            session,
            reader,
            quoter,
            history: RwLock::new(history),
            last_error: RwLock::new(None),
            reserves_busy: Mutex::new(()),
            swap_busy: AtomicBool::new(false),
            metrics: DexMetrics::new()?,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &DexMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub async fn connect_wallet(&self) -> Result<ConnectionState> {
        self.session.connect().await?;
        Ok(self.session.state())
    }

    pub async fn refresh_reserves(&self) -> Result<Attempt<ReserveSample>> {
        let Ok(_guard) = self.reserves_busy.try_lock() else {
            info!("Reserve refresh already in flight, ignoring");
            return Ok(Attempt::Ignored);
        };

        self.fetch_and_record().await.map(Attempt::Completed)
    }

    /// Waits out any fetch in flight, which may predate the swap, then reads
    /// the reserves again.
    async fn refresh_after_swap(&self) -> Result<ReserveSample> {
        let _guard = self.reserves_busy.lock().await;
        self.fetch_and_record().await
    }

    async fn fetch_and_record(&self) -> Result<ReserveSample> {
        let outcome = self.reader.fetch().await;
        self.metrics.record_reserves(&outcome);

        match outcome {
            Ok(sample) => {
                write(&self.history).push(sample.clone());
                *write(&self.last_error) = None;
                Ok(sample)
            }
            Err(e) => {
                warn!("Failed to load reserves: {}", e);
                *write(&self.last_error) = Some(e.to_string());
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn history(&self) -> HistorySnapshot {
        let history = read(&self.history);
        let samples = history.samples();

        HistorySnapshot {
            labels: samples.iter().map(ReserveSample::label).collect(),
            samples,
            domain: history.domain(),
            last_error: read(&self.last_error).clone(),
        }
    }

    #[must_use]
    pub fn latest_sample(&self) -> Option<ReserveSample> {
        read(&self.history).latest().cloned()
    }

    pub async fn quote(&self, request: &SwapRequest) -> Result<SwapQuote> {
        self.quoter.quote(&self.session, request).await
    }

    /// Submits a swap unless one is already outstanding. A confirmed swap is
    /// followed by exactly one reserve refresh.
    pub async fn submit_swap(&self, request: &SwapRequest) -> Result<Attempt<SwapReceipt>> {
        let Some(_guard) = BusyGuard::acquire(&self.swap_busy) else {
            info!("Swap already in flight, ignoring");
            return Ok(Attempt::Ignored);
        };

        info!(
            "Submitting swap of {} ETH with {} bps slippage",
            request.input_amount, request.slippage_bps
        );

        let outcome = self.quoter.submit(&self.session, request).await;
        self.metrics.record_swap(&outcome);
        let receipt = outcome?;

        if let Err(e) = self.refresh_after_swap().await {
            warn!("Post-swap reserve refresh failed: {}", e);
        }

        Ok(Attempt::Completed(receipt))
    }

    /// Polls reserves on the configured interval, starting immediately.
    pub fn spawn_poller(self: Arc<Self>) -> JoinHandle<()> {
        let interval = std::time::Duration::from_secs(self.config.polling.interval_secs.max(1));
        info!("Reserve poller started ({:?} interval)", interval);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                // failures are recorded in `last_error` by refresh_reserves
                if let Ok(Attempt::Ignored) = self.refresh_reserves().await {
                    debug!("Skipped poll tick, previous refresh still running");
                }
            }
        })
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}
