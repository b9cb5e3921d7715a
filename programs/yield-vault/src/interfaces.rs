//! Interfaces the vault consumes from its external collaborators.
//!
//! Every value these return is untrusted. The vault reads amounts from the
//! return values rather than assuming an exchange rate, and treats any error
//! as a reverted sub-call.

use anchor_lang::prelude::*;

use crate::error::VaultError;

/// Liquidity pool that turns the base asset into pool-position tokens.
pub trait PoolInterface {
    /// Deposits `amount` base units, returning the pool tokens minted to the vault.
    fn deposit_base(&mut self, amount: u64) -> Result<u64>;

    /// Burns `pool_tokens`, returning the base units paid to the vault.
    fn withdraw_base(&mut self, pool_tokens: u64) -> Result<u64>;

    /// Value of one pool token in base units, scaled by `VIRTUAL_PRICE_PRECISION`.
    fn virtual_price(&self) -> Result<u64>;
}

/// Staking gauge holding the vault's pool tokens and accruing rewards.
pub trait GaugeInterface {
    fn stake(&mut self, pool_tokens: u64) -> Result<()>;

    fn unstake(&mut self, pool_tokens: u64) -> Result<()>;

    fn staked_balance(&self, holder: &Pubkey) -> Result<u64>;

    fn claimable_rewards(&self, holder: &Pubkey) -> Result<u64>;

    /// Pays out everything claimable, returning the reward amount transferred.
    fn claim_rewards(&mut self, holder: &Pubkey) -> Result<u64>;
}

/// Converts reward tokens into pool-position tokens.
pub trait SwapInterface {
    fn swap(&mut self, reward_amount: u64) -> Result<u64>;
}

/// The three collaborators bound to one vault, plus the address they act for.
pub struct Collaborators<P, G, S> {
    pub vault: Pubkey,
    pub pool: P,
    pub gauge: G,
    pub swap: S,
}

impl<P, G, S> Collaborators<P, G, S>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    pub fn new(vault: Pubkey, pool: P, gauge: G, swap: S) -> Self {
        Self {
            vault,
            pool,
            gauge,
            swap,
        }
    }
}

/// Maps a collaborator failure to `ExternalCallFailed`, logging which sub-call reverted.
pub fn external<T>(call: &str, result: Result<T>) -> Result<T> {
    result.map_err(|err| {
        msg!("External call {} failed: {}", call, err);
        error!(VaultError::ExternalCallFailed)
    })
}
