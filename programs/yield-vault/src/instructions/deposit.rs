use anchor_lang::prelude::*;
use anchor_spl::token_interface::{transfer_checked, Mint, TokenAccount, TransferChecked};

// Brings in the client modules generated for the nested accounts struct
use crate::adapters::*;
use crate::{
    constants::SHARE_BALANCE_SEED,
    engine::processor,
    events::Deposit as DepositEvent,
    instructions::harvest::emit_harvest,
    state::{ShareBalance, Vault},
};

#[derive(Accounts)]
pub struct DepositBase<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,

    #[account(
        init_if_needed,
        payer = user,
        space = ShareBalance::LEN,
        seeds = [SHARE_BALANCE_SEED, vault.key().as_ref(), user.key().as_ref()],
        bump
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

    pub system_program: Program<'info, System>,
}

/// Deposit base asset, convert it to staked pool position and mint shares
pub fn handler(ctx: Context<DepositBase>, base_amount: u64, min_shares_out: u64) -> Result<()> {
    let mut ext = ctx
        .accounts
        .collaborators
        .bind(ctx.accounts.vault.to_account_info(), &ctx.accounts.vault)?;

    // The user's signature is the allowance
    transfer_checked(
        CpiContext::new(
            ctx.accounts.collaborators.token_program.to_account_info(),
            TransferChecked {
                from: ctx.accounts.user_base_account.to_account_info(),
                to: ctx.accounts.collaborators.base_vault.to_account_info(),
                mint: ctx.accounts.base_mint.to_account_info(),
                authority: ctx.accounts.user.to_account_info(),
            },
        ),
        base_amount,
        ctx.accounts.base_mint.decimals,
    )?;

    let vault_key = ctx.accounts.vault.key();
    let user_key = ctx.accounts.user.key();
    let shares_before = ctx.accounts.vault.total_shares;

    let share_balance = &mut ctx.accounts.share_balance;
    if share_balance.owner == Pubkey::default() {
        share_balance.vault = vault_key;
        share_balance.owner = user_key;
        share_balance.bump = ctx.bumps.share_balance;
    }

    let receipt = processor::deposit(
        &mut ctx.accounts.vault,
        &mut ctx.accounts.share_balance,
        &mut ext,
        base_amount,
        min_shares_out,
    )?;

    if let Some(record) = receipt.harvest {
        emit_harvest(vault_key, user_key, &record, shares_before)?;
    }

    emit!(DepositEvent {
        vault: vault_key,
        owner: user_key,
        base_amount,
        position_gained: receipt.position_gained,
        shares: receipt.shares_minted,
    });

    Ok(())
}
