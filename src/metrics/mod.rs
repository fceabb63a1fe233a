/*
 * Prometheus metrics for reserve polling and swaps
 */

use ethers::types::U256;
use ethers::utils::format_ether;
use prometheus::{Encoder, Gauge, IntCounterVec, Opts, Registry, TextEncoder};
use crate::models::{DexError, ReserveSample, Result};

pub struct DexMetrics {
    registry: Registry,
    reserve_fetches: IntCounterVec,
    swaps: IntCounterVec,
    reserve_eth: Gauge,
    reserve_token: Gauge,
}

impl DexMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let reserve_fetches = IntCounterVec::new(
            Opts::new("dex_reserve_fetches_total", "Reserve fetch attempts by outcome"),
            &["outcome"],
        )
        .map_err(metrics_error)?;
        let swaps = IntCounterVec::new(
            Opts::new("dex_swaps_total", "Swap submissions by outcome"),
            &["outcome"],
        )
        .map_err(metrics_error)?;
        let reserve_eth = Gauge::new("dex_reserve_eth", "Latest ETH reserve").map_err(metrics_error)?;
        let reserve_token =
            Gauge::new("dex_reserve_token", "Latest token reserve").map_err(metrics_error)?;

        registry
            .register(Box::new(reserve_fetches.clone()))
            .map_err(metrics_error)?;
        registry.register(Box::new(swaps.clone())).map_err(metrics_error)?;
        registry
            .register(Box::new(reserve_eth.clone()))
            .map_err(metrics_error)?;
        registry
            .register(Box::new(reserve_token.clone()))
            .map_err(metrics_error)?;

        Ok(Self {
            registry,
            reserve_fetches,
            swaps,
            reserve_eth,
            reserve_token,
        })
    }

    pub fn record_reserves(&self, outcome: &Result<ReserveSample>) {
        self.reserve_fetches
            .with_label_values(&[outcome_label(outcome)])
            .inc();

        // gauges take the unrounded on-chain values
        if let Ok(sample) = outcome {
            self.reserve_eth.set(ether_f64(sample.raw_eth));
            self.reserve_token.set(ether_f64(sample.raw_token));
        }
    }

    pub fn record_swap<T>(&self, outcome: &Result<T>) {
        self.swaps.with_label_values(&[outcome_label(outcome)]).inc();
    }

    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metrics_error)?;
        String::from_utf8(buffer).map_err(|e| DexError::ConfigError(format!("metrics encoding: {e}")))
    }
}

fn outcome_label<T>(outcome: &Result<T>) -> &'static str {
    match outcome {
        Ok(_) => "ok",
        Err(DexError::UserRejected) => "rejected",
        Err(DexError::NetworkUnreachable(_)) => "network",
        Err(_) => "error",
    }
}

fn ether_f64(raw: U256) -> f64 {
    format_ether(raw).parse().unwrap_or_default()
}

fn metrics_error(e: prometheus::Error) -> DexError {
    DexError::ConfigError(format!("metrics: {e}"))
}
