use anchor_lang::prelude::*;

use crate::{
    error::VaultError,
    events::{AuthorityTransferred, AutoCompoundChanged},
    state::Vault,
};

#[derive(Accounts)]
pub struct Admin<'info> {
    #[account(
        constraint = authority.key() == vault.authority @ VaultError::Unauthorized,
    )]
    pub authority: Signer<'info>,

    #[account(mut)]
    pub vault: Account<'info, Vault>,
}

/// Harvest before every deposit and withdrawal when enabled
pub fn set_auto_compound(ctx: Context<Admin>, enabled: bool) -> Result<()> {
    let vault = &mut ctx.accounts.vault;

    vault.auto_compound = enabled;

    emit!(AutoCompoundChanged {
        vault: vault.key(),
        enabled,
    });

    Ok(())
}

/// Transfer vault authority to new address
pub fn transfer_authority(ctx: Context<Admin>, new_authority: Pubkey) -> Result<()> {
    let vault = &mut ctx.accounts.vault;
    let previous_authority = vault.authority;

    vault.authority = new_authority;

    emit!(AuthorityTransferred {
        vault: vault.key(),
        previous_authority,
        new_authority,
    });

    Ok(())
}
