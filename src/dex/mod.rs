/*
 * SimpleDEX contract ABI surface: selectors, call encoding and return decoding
 */

use ethers::{
    abi::{encode, Token},
    types::{Bytes, U256},
    utils::keccak256,
};
use crate::models::{DexError, Result};

pub const RESERVE_ETH_SIGNATURE: &str = "reserveETH()";
pub const RESERVE_TOKEN_SIGNATURE: &str = "reserveToken()";
pub const GET_TOKEN_AMOUNT_SIGNATURE: &str = "getTokenAmount(uint256)";
pub const SWAP_PROTECTED_SIGNATURE: &str = "swapETHForToken(uint256,uint256)";
pub const SWAP_UNPROTECTED_SIGNATURE: &str = "swapETHForToken()";

#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn encode_call(signature: &str, params: &[Token]) -> Bytes {
    let mut call_data = Vec::from(selector(signature));
    call_data.extend_from_slice(&encode(params));
    Bytes::from(call_data)
}

#[must_use]
pub fn reserve_eth_call() -> Bytes {
    encode_call(RESERVE_ETH_SIGNATURE, &[])
}

#[must_use]
pub fn reserve_token_call() -> Bytes {
    encode_call(RESERVE_TOKEN_SIGNATURE, &[])
}

#[must_use]
pub fn get_token_amount_call(amount_in_wei: U256) -> Bytes {
    encode_call(GET_TOKEN_AMOUNT_SIGNATURE, &[Token::Uint(amount_in_wei)])
}

pub fn decode_uint256(output: &Bytes) -> Result<U256> {
    if output.is_empty() {
        return Err(DexError::EmptyResponseData);
    }

    if output.len() < 32 {
        return Err(DexError::UnknownReadFailure(format!(
            "malformed uint256 return data ({} bytes)",
            output.len()
        )));
    }

    Ok(U256::from_big_endian(&output[0..32]))
}

/// The swap entry point to call, one variant per deployed ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapCall {
    Protected { min_output: U256, deadline: u64 },
    Unprotected,
}

impl SwapCall {
    #[must_use]
    pub fn calldata(&self) -> Bytes {
        match self {
            SwapCall::Protected { min_output, deadline } => encode_call(
                SWAP_PROTECTED_SIGNATURE,
                &[Token::Uint(*min_output), Token::Uint(U256::from(*deadline))],
            ),
            SwapCall::Unprotected => encode_call(SWAP_UNPROTECTED_SIGNATURE, &[]),
        }
    }
}
