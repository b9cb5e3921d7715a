use anchor_lang::prelude::*;
use anchor_lang::solana_program::program::set_return_data;

// Brings in the client modules generated for the nested accounts struct
use crate::adapters::*;
use crate::{
    engine::{harvest, ledger, position},
    state::{ShareBalance, Vault},
};

#[derive(Accounts)]
pub struct VaultView<'info> {
    pub vault: Account<'info, Vault>,
}

#[derive(Accounts)]
pub struct HolderView<'info> {
    pub vault: Account<'info, Vault>,

    #[account(constraint = share_balance.vault == vault.key())]
    pub share_balance: Account<'info, ShareBalance>,
}

/// Views that have to ask the gauge or pool
#[derive(Accounts)]
pub struct CollaboratorView<'info> {
    pub vault: Account<'info, Vault>,

    pub collaborators: VaultCollaborators<'info>,
}

pub fn balance_of(ctx: Context<HolderView>) -> Result<()> {
    set_return_data(&ctx.accounts.share_balance.amount.to_le_bytes());
    Ok(())
}

/// Position units the owner's shares redeem for (floor rounding)
pub fn value_of(ctx: Context<HolderView>) -> Result<()> {
    let value = ledger::value_of(&ctx.accounts.vault, &ctx.accounts.share_balance)?;

    set_return_data(&value.to_le_bytes());
    Ok(())
}

pub fn exchange_rate(ctx: Context<VaultView>) -> Result<()> {
    let rate = ledger::exchange_rate(&ctx.accounts.vault)?;

    set_return_data(&rate.to_le_bytes());
    Ok(())
}

pub fn total_shares(ctx: Context<VaultView>) -> Result<()> {
    set_return_data(&ctx.accounts.vault.total_shares.to_le_bytes());
    Ok(())
}

pub fn total_pool_position(ctx: Context<VaultView>) -> Result<()> {
    set_return_data(&ctx.accounts.vault.total_pool_position.to_le_bytes());
    Ok(())
}

pub fn pending_rewards(ctx: Context<CollaboratorView>) -> Result<()> {
    let ext = ctx
        .accounts
        .collaborators
        .bind(ctx.accounts.vault.to_account_info(), &ctx.accounts.vault)?;
    let pending = harvest::pending_rewards(&ext)?;

    set_return_data(&pending.to_le_bytes());
    Ok(())
}

/// Returns 16 bytes: position of record, then its value in base units
pub fn current_value(ctx: Context<CollaboratorView>) -> Result<()> {
    let ext = ctx
        .accounts
        .collaborators
        .bind(ctx.accounts.vault.to_account_info(), &ctx.accounts.vault)?;
    let value = position::current_value(&ctx.accounts.vault, &ext)?;

    let mut data = [0u8; 16];
    data[..8].copy_from_slice(&value.position.to_le_bytes());
    data[8..].copy_from_slice(&value.base_value.to_le_bytes());
    set_return_data(&data);
    Ok(())
}
