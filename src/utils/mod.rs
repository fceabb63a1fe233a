/*
 * Utility functions and helpers
 */

use ethers::types::{Address, U256};
use ethers::utils::to_checksum;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use crate::models::{DexError, Result};

pub const ETHER_DECIMALS: u32 = 18;
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Accepts `0x` + 40 hex digits. Mixed-case input must carry a valid
/// EIP-55 checksum.
pub fn parse_address(raw: &str) -> Result<Address> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .ok_or_else(|| DexError::InvalidAddress(raw.to_string()))?;

    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DexError::InvalidAddress(raw.to_string()));
    }

    let address = Address::from_str(hex).map_err(|_| DexError::InvalidAddress(raw.to_string()))?;

    let is_mixed_case = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());
    if is_mixed_case && to_checksum(&address, None) != raw {
        return Err(DexError::InvalidAddress(raw.to_string()));
    }

    Ok(address)
}

/// `0x1d61...CF02`
#[must_use]
pub fn shorten_address(address: &Address) -> String {
    let full = to_checksum(address, None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Exact decimal ETH -> wei. More than 18 fractional digits cannot be
/// represented on chain and is rejected like a non-positive amount.
pub fn to_wei(amount: Decimal) -> Result<U256> {
    if amount <= Decimal::ZERO || amount.scale() > ETHER_DECIMALS {
        return Err(DexError::InvalidAmount);
    }

    let mantissa = u128::try_from(amount.mantissa()).map_err(|_| DexError::InvalidAmount)?;
    let exponent = ETHER_DECIMALS - amount.scale();

    U256::from(mantissa)
        .checked_mul(U256::exp10(exponent as usize))
        .ok_or(DexError::InvalidAmount)
}

/// 18-decimal fixed point -> decimal rounded half-up to 3 digits.
pub fn format_units_3dp(raw: U256) -> Result<Decimal> {
    let unit = U256::exp10((ETHER_DECIMALS - 3) as usize);
    let milli = (raw / unit) + if raw % unit >= unit / 2 { U256::one() } else { U256::zero() };

    if milli > U256::from(i128::MAX as u128) {
        return Err(DexError::UnknownReadFailure(format!(
            "reserve value {raw} exceeds display range"
        )));
    }

    #[allow(clippy::cast_possible_wrap)]
    Decimal::try_from_i128_with_scale(milli.as_u128() as i128, 3).map_err(|e| {
        DexError::UnknownReadFailure(format!("reserve value {raw} exceeds display range: {e}"))
    })
}

/// Slippage percent (e.g. `0.5`) -> basis points, rounded half away from zero.
pub fn percent_to_bps(percent: Decimal) -> Result<u32> {
    if percent < Decimal::ZERO || percent >= Decimal::ONE_HUNDRED {
        return Err(DexError::InvalidSlippage);
    }

    (percent * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .filter(|bps| *bps < BPS_DENOMINATOR)
        .ok_or(DexError::InvalidSlippage)
}

/// `floor(estimated * (10000 - bps) / 10000)`, split over the quotient
/// and remainder of `estimated / 10000` so it cannot overflow for any `U256`.
#[must_use]
pub fn min_output(estimated: U256, slippage_bps: u32) -> U256 {
    let denominator = U256::from(BPS_DENOMINATOR);
    let kept = U256::from(BPS_DENOMINATOR.saturating_sub(slippage_bps));
    let (quotient, remainder) = estimated.div_mod(denominator);
    quotient * kept + remainder * kept / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_checksummed_and_lowercase_addresses() {
        let checksummed = "0x1d61EE6cc145A68Da54Ced80F6956498bcCaCF02";
        let address = parse_address(checksummed).unwrap();
        assert_eq!(parse_address(&checksummed.to_lowercase()).unwrap(), address);
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in [
            "",
            "1d61EE6cc145A68Da54Ced80F6956498bcCaCF02",
            "0x1d61EE6cc145A68Da54Ced80F6956498bcCaCF0",
            "0x1d61EE6cc145A68Da54Ced80F6956498bcCaCFzz",
            // one character flipped in case breaks the checksum
            "0x1D61EE6cc145A68Da54Ced80F6956498bcCaCF02",
        ] {
            assert!(
                matches!(parse_address(raw), Err(DexError::InvalidAddress(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn shortens_like_the_wallet_badge() {
        let address = parse_address("0x1d61EE6cc145A68Da54Ced80F6956498bcCaCF02").unwrap();
        assert_eq!(shorten_address(&address), "0x1d61...CF02");
    }

    #[test]
    fn converts_ether_to_wei_exactly() {
        assert_eq!(
            to_wei(Decimal::from_str("0.1").unwrap()).unwrap(),
            U256::exp10(17)
        );
        assert_eq!(
            to_wei(Decimal::from_str("0.000000000000000001").unwrap()).unwrap(),
            U256::one()
        );
        assert_eq!(to_wei(Decimal::from(2)).unwrap(), U256::exp10(18) * 2);
    }

    #[test]
    fn rejects_unrepresentable_amounts() {
        assert_eq!(to_wei(Decimal::ZERO), Err(DexError::InvalidAmount));
        assert_eq!(to_wei(Decimal::from(-1)), Err(DexError::InvalidAmount));
        assert_eq!(
            to_wei(Decimal::from_str("0.0000000000000000001").unwrap()),
            Err(DexError::InvalidAmount)
        );
    }

    #[test]
    fn formats_reserves_to_three_places() {
        // 12.3456 ETH
        let raw = U256::from(12_345_600_000_000_000_000u128);
        assert_eq!(format_units_3dp(raw).unwrap(), Decimal::from_str("12.346").unwrap());
        assert_eq!(format_units_3dp(U256::zero()).unwrap(), Decimal::ZERO);
        // 0.0004999 rounds down, 0.0005 rounds up
        assert_eq!(
            format_units_3dp(U256::from(499_900_000_000_000u128)).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            format_units_3dp(U256::from(500_000_000_000_000u128)).unwrap(),
            Decimal::from_str("0.001").unwrap()
        );
    }

    #[test]
    fn oversized_reserve_is_a_read_failure() {
        assert!(matches!(
            format_units_3dp(U256::MAX),
            Err(DexError::UnknownReadFailure(_))
        ));
    }

    #[test]
    fn percent_converts_to_bps() {
        assert_eq!(percent_to_bps(Decimal::ONE).unwrap(), 100);
        assert_eq!(percent_to_bps(Decimal::from_str("0.005").unwrap()).unwrap(), 1);
        assert_eq!(percent_to_bps(Decimal::from_str("99.99").unwrap()).unwrap(), 9999);
        assert_eq!(percent_to_bps(Decimal::ONE_HUNDRED), Err(DexError::InvalidSlippage));
        assert_eq!(percent_to_bps(Decimal::from(-1)), Err(DexError::InvalidSlippage));
        // 99.996% rounds to 10000 bps
        assert_eq!(
            percent_to_bps(Decimal::from_str("99.996").unwrap()),
            Err(DexError::InvalidSlippage)
        );
    }

    #[test]
    fn min_output_matches_floor_formula() {
        assert_eq!(min_output(U256::from(1_000_000u64), 100), U256::from(990_000u64));
        assert_eq!(min_output(U256::one(), 9999), U256::zero());
        assert_eq!(min_output(U256::from(12_345u64), 0), U256::from(12_345u64));

        for (estimated, bps) in [(1u64, 1u32), (7, 3333), (10_001, 9999), (123_456_789, 250)] {
            let expected = estimated * u64::from(10_000 - bps) / 10_000;
            let actual = min_output(U256::from(estimated), bps);
            assert_eq!(actual, U256::from(expected), "estimated={estimated} bps={bps}");
            assert!(actual <= U256::from(estimated));
        }
    }

    #[test]
    fn min_output_does_not_overflow_at_max() {
        let bound = min_output(U256::MAX, 100);
        assert!(bound < U256::MAX);
        assert!(bound > U256::zero());
    }
}
