/*
 * REST API module for the Simple DEX console
 */

use rocket::http::{ContentType, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{get, post, routes, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use crate::config::Config;
use crate::models::{ConnectionState, DexError, ReserveSample, SwapRequest};
use crate::service::{Attempt, DexService, HistorySnapshot};
use crate::utils::{percent_to_bps, shorten_address};

/// 1%, the form's default tolerance.
pub const DEFAULT_SLIPPAGE_BPS: u32 = 100;

type ApiResult<T> = std::result::Result<T, Custom<String>>;

pub struct ApiState {
    pub config: Config,
    pub dex_service: Arc<DexService>,
}

#[derive(Debug, Deserialize)]
pub struct SwapBody {
    pub amount_eth: String,
    #[serde(default)]
    pub slippage_bps: Option<u32>,
    #[serde(default)]
    pub slippage_percent: Option<String>,
}

impl SwapBody {
    pub fn into_request(self) -> crate::models::Result<SwapRequest> {
        let input_amount =
            Decimal::from_str(self.amount_eth.trim()).map_err(|_| DexError::InvalidAmount)?;

        let slippage_bps = match (self.slippage_bps, self.slippage_percent) {
            (Some(bps), _) => bps,
            (None, Some(percent)) => percent_to_bps(
                Decimal::from_str(percent.trim()).map_err(|_| DexError::InvalidSlippage)?,
            )?,
            (None, None) => DEFAULT_SLIPPAGE_BPS,
        };

        Ok(SwapRequest {
            input_amount,
            slippage_bps,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub connection: ConnectionState,
    pub short_address: Option<String>,
}

impl From<ConnectionState> for WalletResponse {
    fn from(connection: ConnectionState) -> Self {
        Self {
            short_address: connection.account().as_ref().map(shorten_address),
            connection,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub amount_in_wei: String,
    pub estimated_output: String,
    pub min_output: String,
    pub slippage_bps: u32,
}

#[derive(Debug, Serialize)]
pub struct SwapResponse {
    pub status: String,
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

fn status_for(err: &DexError) -> Status {
    match err {
        DexError::InvalidAmount
        | DexError::InvalidSlippage
        | DexError::InvalidAddress(_)
        | DexError::ContractNotConfigured
        | DexError::QuoteUnavailable
        | DexError::UserRejected => Status::BadRequest,
        DexError::WalletNotConnected | DexError::WrongNetwork { .. } => Status::Conflict,
        DexError::InsufficientLiquidity | DexError::SlippageTooHigh => Status::UnprocessableEntity,
        DexError::NoProviderAvailable
        | DexError::ContractNotDeployed(_)
        | DexError::NetworkUnreachable(_)
        | DexError::ContractCallReverted(_)
        | DexError::EmptyResponseData
        | DexError::UnknownReadFailure(_)
        | DexError::RpcError(_) => Status::BadGateway,
        DexError::TransactionFailed(_) | DexError::ConfigError(_) => Status::InternalServerError,
    }
}

fn reject(prefix: &str, err: &DexError) -> Custom<String> {
    tracing::warn!("{}{}", prefix, err);
    Custom(status_for(err), format!("{prefix}{err}"))
}

#[get("/health")]
pub async fn health_check() -> &'static str {
    "OK"
}

#[get("/api/v1/wallet")]
pub async fn get_wallet(state: &State<ApiState>) -> Json<WalletResponse> {
    Json(state.dex_service.connection_state().into())
}

#[post("/api/v1/wallet/connect")]
pub async fn connect_wallet(state: &State<ApiState>) -> ApiResult<Json<WalletResponse>> {
    let connection = state
        .dex_service
        .connect_wallet()
        .await
        .map_err(|e| reject("Wallet connection failed: ", &e))?;

    Ok(Json(connection.into()))
}

#[get("/api/v1/reserves")]
pub async fn get_reserves(state: &State<ApiState>) -> ApiResult<Json<ReserveSample>> {
    match state.dex_service.refresh_reserves().await {
        Ok(Attempt::Completed(sample)) => Ok(Json(sample)),
        // a refresh is already running; serve the newest sample we have
        Ok(Attempt::Ignored) => state.dex_service.latest_sample().map(Json).ok_or_else(|| {
            Custom(Status::Conflict, "Reserve refresh already in progress".to_string())
        }),
        Err(e) => Err(reject("", &e)),
    }
}

#[get("/api/v1/reserves/history")]
pub async fn get_reserve_history(state: &State<ApiState>) -> Json<HistorySnapshot> {
    Json(state.dex_service.history())
}

#[post("/api/v1/swap/quote", data = "<body>")]
pub async fn quote_swap(body: Json<SwapBody>, state: &State<ApiState>) -> ApiResult<Json<QuoteResponse>> {
    let request = body
        .into_inner()
        .into_request()
        .map_err(|e| reject("Swap failed: ", &e))?;

    let quote = state
        .dex_service
        .quote(&request)
        .await
        .map_err(|e| reject("Swap failed: ", &e))?;

    Ok(Json(QuoteResponse {
        amount_in_wei: quote.input_wei.to_string(),
        estimated_output: quote.estimated_output.to_string(),
        min_output: quote.min_output.to_string(),
        slippage_bps: request.slippage_bps,
    }))
}

#[post("/api/v1/swap", data = "<body>")]
pub async fn submit_swap(body: Json<SwapBody>, state: &State<ApiState>) -> ApiResult<Json<SwapResponse>> {
    let request = body
        .into_inner()
        .into_request()
        .map_err(|e| reject("Swap failed: ", &e))?;

    match state.dex_service.submit_swap(&request).await {
        Ok(Attempt::Completed(receipt)) => {
            let tx_hash = format!("{:?}", receipt.tx_hash);
            Ok(Json(SwapResponse {
                status: format!("Swap confirmed. Hash: {tx_hash}"),
                tx_hash,
                block_number: receipt.block_number,
            }))
        }
        Ok(Attempt::Ignored) => Err(Custom(
            Status::Conflict,
            "A swap is already in progress".to_string(),
        )),
        Err(e) => Err(reject("Swap failed: ", &e)),
    }
}

#[get("/metrics")]
pub async fn metrics(state: &State<ApiState>) -> ApiResult<(ContentType, String)> {
    state
        .dex_service
        .metrics()
        .render()
        .map(|text| (ContentType::Plain, text))
        .map_err(|e| reject("", &e))
}

#[must_use]
pub fn create_rocket(state: ApiState) -> rocket::Rocket<rocket::Build> {
    let figment = rocket::Config::figment()
        .merge(("address", state.config.server.host.clone()))
        .merge(("port", state.config.server.port));

    rocket::custom(figment).manage(state).mount(
        "/",
        routes![
            health_check,
            get_wallet,
            connect_wallet,
            get_reserves,
            get_reserve_history,
            quote_swap,
            submit_swap,
            metrics
        ],
    )
}
