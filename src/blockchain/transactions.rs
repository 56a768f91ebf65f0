// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction payloads, receipts and fixed-point amount conversion.
//!
//! Amounts are always handled as `U256` in the token's smallest unit. Decimal
//! strings are converted digit by digit so that 18-decimal values never pass
//! through floating point.

use alloy::primitives::{Address, TxHash, U256};

use super::types::{Network, TokenKind};

/// Arguments of a single `distributeEth` / `distributeTokens` call.
///
/// Built once from a validated request and shared by gas estimation and
/// submission so both see identical calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributeCall {
    pub token: TokenKind,
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
    pub network: Network,
    /// Value attached to the call (total plus fee for native, zero for ERC-20).
    pub value: U256,
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}

/// A decoded `EthDistributed` / `TokensDistributed` log.
#[derive(Debug, Clone)]
pub struct DistributionEvent {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub token: TokenKind,
    pub recipient_count: usize,
    pub total_amount: U256,
}

/// Why a decimal amount string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount is not a decimal number")]
    Malformed,

    #[error("amount must be greater than zero")]
    NotPositive,

    #[error("too many decimal places (max {0})")]
    TooManyDecimals(u8),

    #[error("amount overflows 256 bits")]
    Overflow,
}

/// Parse a human-readable amount to its smallest unit.
///
/// Accepts `1`, `1.5`, `.5` and `1.`; trailing fractional zeros beyond the
/// token precision are ignored. Signs, exponents and separators are rejected.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Malformed);
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::Malformed);
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals(decimals));
    }

    let mut value = U256::ZERO;
    let padded = fraction
        .bytes()
        .chain(std::iter::repeat_n(b'0', decimals as usize - fraction.len()));
    for digit in whole.bytes().chain(padded) {
        value = value
            .checked_mul(U256::from(10u8))
            .and_then(|v| v.checked_add(U256::from(digit - b'0')))
            .ok_or(AmountError::Overflow)?;
    }

    if value.is_zero() {
        return Err(AmountError::NotPositive);
    }
    Ok(value)
}

/// Format wei (or token units) to human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_amount_whole() {
        let result = parse_amount("1", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_decimal() {
        let result = parse_amount("1.5", 18).unwrap();
        assert_eq!(result, U256::from(1_500_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_usdc() {
        // 1.5 USDC = 1_500_000 (6 decimals)
        let result = parse_amount("1.5", 6).unwrap();
        assert_eq!(result, U256::from(1_500_000u64));
    }

    #[test]
    fn test_parse_amount_partial_forms() {
        assert_eq!(parse_amount(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount("2.", 6).unwrap(), U256::from(2_000_000u64));
        assert_eq!(parse_amount("1.500000000", 6).unwrap(), U256::from(1_500_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert_eq!(parse_amount("", 18), Err(AmountError::Empty));
        assert_eq!(parse_amount("  ", 18), Err(AmountError::Empty));
        assert_eq!(parse_amount(".", 18), Err(AmountError::Malformed));
        assert_eq!(parse_amount("-1", 18), Err(AmountError::Malformed));
        assert_eq!(parse_amount("1e18", 18), Err(AmountError::Malformed));
        assert_eq!(parse_amount("1.2.3", 18), Err(AmountError::Malformed));
        assert_eq!(parse_amount("1,5", 18), Err(AmountError::Malformed));
        assert_eq!(parse_amount("0", 18), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("0.000", 18), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("0.0000001", 6), Err(AmountError::TooManyDecimals(6)));
    }

    #[test]
    fn test_parse_amount_beyond_u128() {
        // 10^30 ETH does not fit in u128 wei but does fit in U256.
        let raw = format!("1{}", "0".repeat(30));
        let value = parse_amount(&raw, 18).unwrap();
        assert_eq!(value, U256::from(10u64).pow(U256::from(48u64)));
    }

    #[test]
    fn test_parse_amount_overflow() {
        let raw = "9".repeat(80);
        assert_eq!(parse_amount(&raw, 18), Err(AmountError::Overflow));
    }

    #[test]
    fn test_format_amount() {
        let one_eth = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_amount(one_eth, 18), "1");

        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_half, 18), "1.5");

        assert_eq!(format_amount(U256::from(1u64), 18), "0.000000000000000001");
    }

    #[test]
    fn test_format_amount_usdc() {
        let one_usdc = U256::from(1_000_000u64);
        assert_eq!(format_amount(one_usdc, 6), "1");

        let one_and_half = U256::from(1_500_000u64);
        assert_eq!(format_amount(one_and_half, 6), "1.5");
    }

    proptest! {
        #[test]
        fn parse_matches_integer_reference(whole in 0u64..1_000_000_000, frac in 0u64..1_000_000_000_000_000_000) {
            prop_assume!(whole > 0 || frac > 0);
            let text = format!("{whole}.{frac:018}");
            let expected = U256::from(whole) * U256::from(10u64).pow(U256::from(18u64)) + U256::from(frac);
            prop_assert_eq!(parse_amount(&text, 18).unwrap(), expected);
        }
    }
}
