/*
 * Maps provider failures onto the user-facing error taxonomy
 */

use ethers::providers::{ProviderError, RpcError};
use crate::models::DexError;

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;
/// geth / EIP-1474 "execution reverted".
pub const EXECUTION_REVERTED_CODE: i64 = 3;

const NETWORK_MARKERS: [&str; 6] = [
    "error sending request",
    "connection refused",
    "error trying to connect",
    "dns error",
    "timed out",
    "network is unreachable",
];

pub fn classify_read_error(err: &ProviderError) -> DexError {
    if let ProviderError::HTTPError(e) = err {
        return DexError::NetworkUnreachable(e.to_string());
    }

    if let Some(response) = err.as_error_response() {
        return match classify_code(response.code, &response.message) {
            Some(known) => known,
            None => DexError::UnknownReadFailure(response.message.clone()),
        };
    }

    classify_message(&err.to_string())
        .unwrap_or_else(|| DexError::UnknownReadFailure(err.to_string()))
}

/// Like [`classify_read_error`], but unrecognised failures surface as a
/// failed transaction rather than a failed read.
pub fn classify_wallet_error(err: &ProviderError) -> DexError {
    match classify_read_error(err) {
        DexError::UnknownReadFailure(message) => DexError::TransactionFailed(message),
        known => known,
    }
}

fn classify_code(code: i64, message: &str) -> Option<DexError> {
    if code == USER_REJECTED_CODE {
        return Some(DexError::UserRejected);
    }
    if code == EXECUTION_REVERTED_CODE {
        return Some(DexError::ContractCallReverted(message.to_string()));
    }
    classify_message(message)
}

pub(crate) fn classify_message(message: &str) -> Option<DexError> {
    let lower = message.to_lowercase();

    if lower.contains("action_rejected") || lower.contains("user rejected") {
        Some(DexError::UserRejected)
    } else if NETWORK_MARKERS.iter().any(|marker| lower.contains(marker)) {
        Some(DexError::NetworkUnreachable(message.to_string()))
    } else if lower.contains("revert") {
        Some(DexError::ContractCallReverted(message.to_string()))
    } else {
        None
    }
}
