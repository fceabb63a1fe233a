/*
 * Configuration management for the Simple DEX console
 */

use crate::models::{DexError, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Sepolia, the only network the pool is deployed on.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub chain: ChainConfig,
    pub dex: DexConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Dedicated read endpoint, preferred over the wallet for reserve reads.
    pub rpc_url: Option<String>,
    /// EIP-1193 wallet endpoint; holds the accounts and signs.
    pub wallet_url: Option<String>,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DexConfig {
    pub address: Option<String>,
    pub interface: SwapInterface,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    pub history_window_secs: u64,
    pub history_capacity: usize,
}

/// Which of the two deployed `SimpleDEX` ABIs the pool speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapInterface {
    /// `getTokenAmount` + `swapETHForToken(minTokens, deadline)`
    #[default]
    Protected,
    /// bare `swapETHForToken()`
    Unprotected,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            wallet_url: None,
            chain_id: SEPOLIA_CHAIN_ID,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            history_window_secs: 3600,
            history_capacity: 360,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
                log_level: env::var("LOG_LEVEL").unwrap_or(defaults.server.log_level),
            },
            chain: ChainConfig {
                rpc_url: optional_var("DEX_RPC_URL"),
                wallet_url: optional_var("WALLET_RPC_URL"),
                chain_id: parse_var("DEX_CHAIN_ID", defaults.chain.chain_id)?,
            },
            dex: DexConfig {
                address: optional_var("DEX_ADDRESS"),
                interface: match optional_var("DEX_SWAP_INTERFACE") {
                    Some(raw) => raw.parse()?,
                    None => SwapInterface::default(),
                },
            },
            polling: PollingConfig {
                interval_secs: parse_var("DEX_POLL_INTERVAL_SECS", defaults.polling.interval_secs)?,
                history_window_secs: parse_var(
                    "DEX_HISTORY_WINDOW_SECS",
                    defaults.polling.history_window_secs,
                )?,
                history_capacity: parse_var(
                    "DEX_HISTORY_CAPACITY",
                    defaults.polling.history_capacity,
                )?,
            },
        })
    }

    /// Loads a TOML/JSON/YAML file, with `DEX__SECTION__KEY` variables
    /// taking precedence over the file.
    pub fn from_file(path: &str) -> Result<Self> {
        dotenv::dotenv().ok();

        ::config::Config::builder()
            .add_source(::config::File::with_name(path))
            .add_source(::config::Environment::with_prefix("DEX").separator("__"))
            .build()
            .and_then(::config::Config::try_deserialize)
            .map_err(|e| DexError::ConfigError(format!("Failed to load {path}: {e}")))
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DexError::ConfigError(format!("Invalid {key}: {e}"))),
        None => Ok(default),
    }
}

impl std::str::FromStr for SwapInterface {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "protected" | "slippage" => Ok(SwapInterface::Protected),
            "unprotected" | "simple" => Ok(SwapInterface::Unprotected),
            _ => Err(DexError::ConfigError(format!(
                "Unknown swap interface: {s}"
            ))),
        }
    }
}
