use anchor_lang::prelude::*;

pub mod adapters;
pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod instructions;
pub mod interfaces;
pub mod math;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod state;

use instructions::*;

declare_id!("CpwaYSH3qMk38MZdS7LWtKZGoiXu2cRGNMErAzv5jv99");

#[program]
pub mod yield_vault {
    use super::*;

    /// Create a vault bound to a pool, gauge and swap route for the given base asset
    pub fn initialize(ctx: Context<Initialize>, vault_id: u64, auto_compound: bool) -> Result<()> {
        instructions::initialize::handler(ctx, vault_id, auto_compound)
    }

    /// Deposit base asset, stake the resulting pool position and receive shares
    /// Shares minted use floor rounding - favors vault
    pub fn deposit(ctx: Context<DepositBase>, base_amount: u64, min_shares_out: u64) -> Result<()> {
        instructions::deposit::handler(ctx, base_amount, min_shares_out)
    }

    /// Burn shares, unstake and redeem the released position for base asset
    /// Position released uses floor rounding - favors vault
    pub fn withdraw(ctx: Context<WithdrawBase>, shares: u64, min_base_out: u64) -> Result<()> {
        instructions::withdraw::handler(ctx, shares, min_base_out)
    }

    /// Claim gauge rewards and compound them into the staked position (permissionless)
    pub fn harvest(ctx: Context<HarvestRewards>) -> Result<()> {
        instructions::harvest::handler(ctx)
    }

    /// Harvest before every deposit and withdrawal
    pub fn set_auto_compound(ctx: Context<Admin>, enabled: bool) -> Result<()> {
        instructions::admin::set_auto_compound(ctx, enabled)
    }

    /// Transfer vault authority
    pub fn transfer_authority(ctx: Context<Admin>, new_authority: Pubkey) -> Result<()> {
        instructions::admin::transfer_authority(ctx, new_authority)
    }

    // ============ View Functions (CPI composable) ============

    /// Shares held by an owner
    pub fn balance_of(ctx: Context<HolderView>) -> Result<()> {
        instructions::view::balance_of(ctx)
    }

    /// Position units backing an owner's shares (floor rounding)
    pub fn value_of(ctx: Context<HolderView>) -> Result<()> {
        instructions::view::value_of(ctx)
    }

    /// Position units per share, scaled by 1e9
    pub fn exchange_rate(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::exchange_rate(ctx)
    }

    pub fn total_shares(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::total_shares(ctx)
    }

    pub fn total_pool_position(ctx: Context<VaultView>) -> Result<()> {
        instructions::view::total_pool_position(ctx)
    }

    /// Rewards the gauge would pay out on the next harvest
    pub fn pending_rewards(ctx: Context<CollaboratorView>) -> Result<()> {
        instructions::view::pending_rewards(ctx)
    }

    /// Position of record and its base-asset value at the pool's virtual price
    pub fn current_value(ctx: Context<CollaboratorView>) -> Result<()> {
        instructions::view::current_value(ctx)
    }
}

#[cfg(test)]
mod test_utils {
    use anchor_lang::prelude::*;

    /// Anchor error number carried by a failed result.
    pub fn error_code<T: std::fmt::Debug>(result: Result<T>) -> u32 {
        match result {
            Err(Error::AnchorError(err)) => err.error_code_number,
            Err(Error::ProgramError(err)) => panic!("expected anchor error, got {:?}", err),
            Ok(value) => panic!("expected error, got Ok({:?})", value),
        }
    }
}
