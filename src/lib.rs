/*
 * Simple DEX console
 * Core library exports and module declarations
 */

pub mod api;
pub mod config;
pub mod dex;
pub mod metrics;
pub mod models;
pub mod reserves;
pub mod rpc;
pub mod service;
pub mod swap;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use models::*;
pub use service::DexService;
