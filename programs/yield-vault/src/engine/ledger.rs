//! Share ledger: holder balances and total shares outstanding.
//!
//! Both directions round down, so the vault can never release more position
//! than the burned shares represent. The residue stays with remaining holders.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::math;
use crate::state::{ShareBalance, Vault};

/// Issues shares for `value_added` position units.
///
/// Must run after the position manager credited `value_added`: shares are
/// priced against the position as it stood before the credit.
pub fn mint(vault: &mut Vault, holder: &mut ShareBalance, value_added: u64) -> Result<u64> {
    require!(value_added > 0, VaultError::ZeroValueDeposit);

    let position_before = vault
        .total_pool_position
        .checked_sub(value_added)
        .ok_or(VaultError::MathOverflow)?;

    let shares = math::shares_for_value(value_added, position_before, vault.total_shares)?;
    require!(shares > 0, VaultError::DepositTooSmall);

    vault.total_shares = vault
        .total_shares
        .checked_add(shares)
        .ok_or(VaultError::MathOverflow)?;
    holder.amount = holder
        .amount
        .checked_add(shares)
        .ok_or(VaultError::MathOverflow)?;

    Ok(shares)
}

/// Burns `shares` from `holder`, returning the position units they released.
///
/// The position itself is debited by the position manager.
pub fn burn(vault: &mut Vault, holder: &mut ShareBalance, shares: u64) -> Result<u64> {
    require!(shares > 0, VaultError::ZeroAmount);
    require!(holder.amount >= shares, VaultError::InsufficientShares);

    let value = math::value_for_shares(shares, vault.total_pool_position, vault.total_shares)?;

    vault.total_shares = vault
        .total_shares
        .checked_sub(shares)
        .ok_or(VaultError::InsufficientShares)?;
    holder.amount -= shares;

    Ok(value)
}

/// Position units `holder` could redeem right now.
pub fn value_of(vault: &Vault, holder: &ShareBalance) -> Result<u64> {
    math::value_for_shares(holder.amount, vault.total_pool_position, vault.total_shares)
}

pub fn exchange_rate(vault: &Vault) -> Result<u64> {
    math::exchange_rate(vault.total_pool_position, vault.total_shares)
}
