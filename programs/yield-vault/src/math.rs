use anchor_lang::prelude::*;

use crate::constants::EXCHANGE_RATE_PRECISION;
use crate::error::VaultError;

/// Shares issued for `value` pool-position units added to a vault that held
/// `total_position` units backing `total_shares` shares.
///
/// Formula: shares = floor(value × total_shares / total_position)
///
/// An empty share supply bootstraps at 1:1 in position units, whatever dust
/// the position may still hold.
pub fn shares_for_value(value: u64, total_position: u64, total_shares: u64) -> Result<u64> {
    if total_shares == 0 {
        return Ok(value);
    }
    mul_div(value, total_shares, total_position)
}

/// Pool-position units backing `shares`.
///
/// Formula: value = floor(shares × total_position / total_shares)
pub fn value_for_shares(shares: u64, total_position: u64, total_shares: u64) -> Result<u64> {
    if total_shares == 0 {
        return Ok(0);
    }
    mul_div(shares, total_position, total_shares)
}

/// Position units per share, scaled by `EXCHANGE_RATE_PRECISION`.
pub fn exchange_rate(total_position: u64, total_shares: u64) -> Result<u64> {
    if total_shares == 0 {
        return Ok(EXCHANGE_RATE_PRECISION);
    }
    mul_div(total_position, EXCHANGE_RATE_PRECISION, total_shares)
}

/// Safe multiplication then division, rounding down.
///
/// Computes: floor((value × numerator) / denominator)
/// Uses u128 intermediate to prevent overflow.
pub fn mul_div(value: u64, numerator: u64, denominator: u64) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = (value as u128)
        .checked_mul(numerator as u128)
        .ok_or(VaultError::MathOverflow)?;
    let result = product / (denominator as u128);

    require!(result <= u64::MAX as u128, VaultError::MathOverflow);
    Ok(result as u64)
}
