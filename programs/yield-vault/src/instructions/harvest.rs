use anchor_lang::prelude::*;

// Brings in the client modules generated for the nested accounts struct
use crate::adapters::*;
use crate::{
    engine::processor,
    events::Harvest as HarvestEvent,
    math::exchange_rate,
    state::{HarvestRecord, Vault},
};

#[derive(Accounts)]
pub struct HarvestRewards<'info> {
    /// Anyone may harvest
    pub caller: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    pub collaborators: VaultCollaborators<'info>,
}

/// Harvests never touch the share supply, so `total_shares` is the supply the
/// record's position was spread over.
pub(crate) fn emit_harvest(
    vault: Pubkey,
    caller: Pubkey,
    record: &HarvestRecord,
    total_shares: u64,
) -> Result<()> {
    emit!(HarvestEvent {
        vault,
        caller,
        rewards_claimed: record.rewards_claimed,
        position_gained: record.position_gained,
        total_pool_position: record.total_pool_position,
        exchange_rate: exchange_rate(record.total_pool_position, total_shares)?,
    });
    Ok(())
}

/// Claim gauge rewards, swap them into pool position and stake the result
pub fn handler(ctx: Context<HarvestRewards>) -> Result<()> {
    let mut ext = ctx
        .accounts
        .collaborators
        .bind(ctx.accounts.vault.to_account_info(), &ctx.accounts.vault)?;

    let record = processor::harvest(&mut ctx.accounts.vault, &mut ext)?;

    emit_harvest(
        ctx.accounts.vault.key(),
        ctx.accounts.caller.key(),
        &record,
        ctx.accounts.vault.total_shares,
    )
}
