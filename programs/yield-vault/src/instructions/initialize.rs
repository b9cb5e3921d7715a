use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token_interface::{Mint, TokenAccount, TokenInterface},
};

use crate::{constants::VAULT_SEED, events::VaultInitialized, state::Vault};

#[derive(Accounts)]
#[instruction(vault_id: u64)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = Vault::LEN,
        seeds = [VAULT_SEED, base_mint.key().as_ref(), &vault_id.to_le_bytes()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    #[account(mint::token_program = token_program)]
    pub base_mint: InterfaceAccount<'info, Mint>,

    #[account(mint::token_program = token_program)]
    pub pool_mint: InterfaceAccount<'info, Mint>,

    #[account(mint::token_program = token_program)]
    pub reward_mint: InterfaceAccount<'info, Mint>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = base_mint,
        associated_token::authority = vault,
        associated_token::token_program = token_program,
    )]
    pub base_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = pool_mint,
        associated_token::authority = vault,
        associated_token::token_program = token_program,
    )]
    pub pool_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(
        init,
        payer = authority,
        associated_token::mint = reward_mint,
        associated_token::authority = vault,
        associated_token::token_program = token_program,
    )]
    pub reward_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// CHECK: Pool program, bound to the vault for its lifetime
    #[account(executable)]
    pub pool_program: UncheckedAccount<'info>,

    /// CHECK: Pool state account, must be owned by the pool program
    #[account(owner = pool_program.key())]
    pub pool_state: UncheckedAccount<'info>,

    /// CHECK: Gauge program, bound to the vault for its lifetime
    #[account(executable)]
    pub gauge_program: UncheckedAccount<'info>,

    /// CHECK: Gauge state account, must be owned by the gauge program
    #[account(owner = gauge_program.key())]
    pub gauge_state: UncheckedAccount<'info>,

    /// CHECK: Swap program, bound to the vault for its lifetime
    #[account(executable)]
    pub swap_program: UncheckedAccount<'info>,

    /// CHECK: Swap state account, must be owned by the swap program
    #[account(owner = swap_program.key())]
    pub swap_state: UncheckedAccount<'info>,

    pub token_program: Interface<'info, TokenInterface>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, vault_id: u64, auto_compound: bool) -> Result<()> {
    let bump = ctx.bumps.vault;
    let Initialize {
        authority,
        vault,
        base_mint,
        pool_mint,
        reward_mint,
        base_vault,
        pool_vault,
        reward_vault,
        pool_program,
        pool_state,
        gauge_program,
        gauge_state,
        swap_program,
        swap_state,
        ..
    } = ctx.accounts;

    vault.authority = authority.key();
    vault.base_mint = base_mint.key();
    vault.pool_mint = pool_mint.key();
    vault.reward_mint = reward_mint.key();
    vault.base_vault = base_vault.key();
    vault.pool_vault = pool_vault.key();
    vault.reward_vault = reward_vault.key();
    vault.pool_program = pool_program.key();
    vault.pool_state = pool_state.key();
    vault.gauge_program = gauge_program.key();
    vault.gauge_state = gauge_state.key();
    vault.swap_program = swap_program.key();
    vault.swap_state = swap_state.key();
    vault.total_shares = 0;
    vault.total_pool_position = 0;
    vault.auto_compound = auto_compound;
    vault.vault_id = vault_id;
    vault.bump = bump;
    vault._reserved = [0u8; 32];

    emit!(VaultInitialized {
        vault: vault.key(),
        authority: vault.authority,
        base_mint: vault.base_mint,
        pool_mint: vault.pool_mint,
        pool_program: vault.pool_program,
        gauge_program: vault.gauge_program,
        swap_program: vault.swap_program,
        vault_id,
        auto_compound,
    });

    msg!("Vault {} initialized for base {}", vault_id, vault.base_mint);

    Ok(())
}
