use anchor_lang::prelude::*;
use anchor_spl::token_interface::{transfer_checked, Mint, TokenAccount, TransferChecked};

// Brings in the client modules generated for the nested accounts struct
use crate::adapters::*;
use crate::{
    constants::{SHARE_BALANCE_SEED, VAULT_SEED},
    engine::processor,
    error::VaultError,
    events::Withdraw as WithdrawEvent,
    instructions::harvest::emit_harvest,
    state::{ShareBalance, Vault},
};

#[derive(Accounts)]
pub struct WithdrawBase<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        mut,
        seeds = [SHARE_BALANCE_SEED, vault.key().as_ref(), user.key().as_ref()],
        bump = share_balance.bump,
        constraint = share_balance.owner == user.key() @ VaultError::Unauthorized,
    )]
    pub share_balance: Account<'info, ShareBalance>,

    #[account(
        constraint = base_mint.key() == vault.base_mint,
    )]
    pub base_mint: InterfaceAccount<'info, Mint>,

    #[account(
        mut,
        constraint = user_base_account.mint == vault.base_mint,
        constraint = user_base_account.owner == user.key(),
    )]
    pub user_base_account: InterfaceAccount<'info, TokenAccount>,

    pub collaborators: VaultCollaborators<'info>,
}

/// Burn shares, redeem the released position (floor rounding - protects vault)
/// and pay the base asset out to the user
pub fn handler(ctx: Context<WithdrawBase>, shares: u64, min_base_out: u64) -> Result<()> {
    let mut ext = ctx
        .accounts
        .collaborators
        .bind(ctx.accounts.vault.to_account_info(), &ctx.accounts.vault)?;

    let vault_key = ctx.accounts.vault.key();
    let user_key = ctx.accounts.user.key();
    let shares_before = ctx.accounts.vault.total_shares;

    let receipt = processor::withdraw(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.share_balance,
        &mut ext,
        shares,
        min_base_out,
    )?;

    let base_mint_key = ctx.accounts.vault.base_mint;
    let vault_id_bytes = ctx.accounts.vault.vault_id.to_le_bytes();
    let bump = ctx.accounts.vault.bump;
    let signer_seeds: &[&[&[u8]]] = &[&[
        VAULT_SEED,
        base_mint_key.as_ref(),
        vault_id_bytes.as_ref(),
        &[bump],
    ]];

    if receipt.base_returned > 0 {
        transfer_checked(
            CpiContext::new_with_signer(
                ctx.accounts.collaborators.token_program.to_account_info(),
                TransferChecked {
                    from: ctx.accounts.collaborators.base_vault.to_account_info(),
                    to: ctx.accounts.user_base_account.to_account_info(),
                    mint: ctx.accounts.base_mint.to_account_info(),
                    authority: ctx.accounts.vault.to_account_info(),
                },
                signer_seeds,
            ),
            receipt.base_returned,
            ctx.accounts.base_mint.decimals,
        )?;
    }

    if let Some(record) = receipt.harvest {
        emit_harvest(vault_key, user_key, &record, shares_before)?;
    }

    emit!(WithdrawEvent {
        vault: vault_key,
        owner: user_key,
        shares: receipt.shares_burned,
        position_released: receipt.position_released,
        base_returned: receipt.base_returned,
    });

    // Return rent once the holder has fully exited
    if ctx.accounts.share_balance.amount == 0 {
        ctx.accounts
            .share_balance
            .close(ctx.accounts.user.to_account_info())?;
    }

    Ok(())
}
