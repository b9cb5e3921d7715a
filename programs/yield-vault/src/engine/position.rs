//! Position manager: the single staked pool position the vault custodies.
//!
//! Share math runs on raw position units. The pool's virtual price is only
//! read for display valuation.

use anchor_lang::prelude::*;

use crate::constants::VIRTUAL_PRICE_PRECISION;
use crate::error::VaultError;
use crate::interfaces::{external, Collaborators, GaugeInterface, PoolInterface, SwapInterface};
use crate::math::mul_div;
use crate::state::{PositionValue, Vault};

/// Converts `amount` base units into pool position and stakes all of it.
///
/// Returns the pool tokens the pool reported minting; no exchange rate is assumed.
pub fn deposit_base<P, G, S>(
    vault: &mut Vault,
    ext: &mut Collaborators<P, G, S>,
    amount: u64,
) -> Result<u64>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    require!(amount > 0, VaultError::ZeroAmount);

    let gained = external("pool.deposit_base", ext.pool.deposit_base(amount))?;
    if gained > 0 {
        external("gauge.stake", ext.gauge.stake(gained))?;
    }

    vault.total_pool_position = vault
        .total_pool_position
        .checked_add(gained)
        .ok_or(VaultError::MathOverflow)?;

    Ok(gained)
}

/// Unstakes `position_amount` and redeems it through the pool for base units.
pub fn withdraw_to_base<P, G, S>(
    vault: &mut Vault,
    ext: &mut Collaborators<P, G, S>,
    position_amount: u64,
) -> Result<u64>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    require!(position_amount > 0, VaultError::ZeroAmount);
    require!(
        position_amount <= vault.total_pool_position,
        VaultError::InsufficientPosition
    );

    external("gauge.unstake", ext.gauge.unstake(position_amount))?;
    let base_returned = external(
        "pool.withdraw_base",
        ext.pool.withdraw_base(position_amount),
    )?;

    vault.total_pool_position -= position_amount;

    Ok(base_returned)
}

/// Reads the gauge's view of the vault's stake and fails if it holds less
/// than the position of record.
pub fn verify_custody<P, G, S>(vault: &Vault, ext: &Collaborators<P, G, S>) -> Result<u64>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    let staked = external(
        "gauge.staked_balance",
        ext.gauge.staked_balance(&ext.vault),
    )?;

    if staked < vault.total_pool_position {
        msg!(
            "Gauge reports {} staked, vault of record holds {}",
            staked,
            vault.total_pool_position
        );
        return err!(VaultError::ExternalCallFailed);
    }

    Ok(staked)
}

pub fn current_value<P, G, S>(vault: &Vault, ext: &Collaborators<P, G, S>) -> Result<PositionValue>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    let staked = verify_custody(vault, ext)?;
    let virtual_price = external("pool.virtual_price", ext.pool.virtual_price())?;
    let base_value = mul_div(vault.total_pool_position, virtual_price, VIRTUAL_PRICE_PRECISION)?;

    Ok(PositionValue {
        position: vault.total_pool_position,
        staked,
        virtual_price,
        base_value,
    })
}
