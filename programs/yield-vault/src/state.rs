use anchor_lang::prelude::*;

use crate::constants::{SHARE_BALANCE_SEED, VAULT_SEED};

#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Vault {
    /// Admin who can change the compounding policy and transfer authority
    pub authority: Pubkey,
    /// Asset accepted on deposit and returned on withdrawal
    pub base_mint: Pubkey,
    /// Receipt token minted by the pool
    pub pool_mint: Pubkey,
    /// Token paid out by the gauge
    pub reward_mint: Pubkey,
    /// Vault-owned token accounts
    pub base_vault: Pubkey,
    pub pool_vault: Pubkey,
    pub reward_vault: Pubkey,
    /// Collaborator programs and the state accounts they operate on
    pub pool_program: Pubkey,
    pub pool_state: Pubkey,
    pub gauge_program: Pubkey,
    pub gauge_state: Pubkey,
    pub swap_program: Pubkey,
    pub swap_state: Pubkey,
    /// Sum of every holder's share balance
    pub total_shares: u64,
    /// Pool position staked in the gauge on the vault's behalf
    pub total_pool_position: u64,
    /// Harvest before every deposit and withdrawal
    pub auto_compound: bool,
    /// Unique vault identifier (allows multiple vaults per base asset)
    pub vault_id: u64,
    /// PDA bump seed
    pub bump: u8,
    /// Reserved for future upgrades
    pub _reserved: [u8; 32],
}

impl Vault {
    pub const LEN: usize = 8 +  // discriminator
        32 * 13 + // authority, mints, token accounts, collaborators
        8 +   // total_shares
        8 +   // total_pool_position
        1 +   // auto_compound
        8 +   // vault_id
        1 +   // bump
        32; // _reserved

    pub const SEED_PREFIX: &'static [u8] = VAULT_SEED;
}

/// One holder's claim on the vault.
#[account]
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShareBalance {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub bump: u8,
}

impl ShareBalance {
    pub const LEN: usize = 8 + // discriminator
        32 + // vault
        32 + // owner
        8 +  // amount
        1; // bump

    pub const SEED_PREFIX: &'static [u8] = SHARE_BALANCE_SEED;
}

/// Outcome of a single harvest. Not persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestRecord {
    pub rewards_claimed: u64,
    pub position_gained: u64,
    pub total_pool_position: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepositReceipt {
    pub base_amount: u64,
    pub position_gained: u64,
    pub shares_minted: u64,
    /// Present when the auto-compound policy ran a harvest first
    pub harvest: Option<HarvestRecord>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawReceipt {
    pub shares_burned: u64,
    pub position_released: u64,
    pub base_returned: u64,
    pub harvest: Option<HarvestRecord>,
}

/// Custody snapshot reported by the position manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionValue {
    /// Position of record
    pub position: u64,
    /// Position the gauge reports as staked for the vault
    pub staked: u64,
    /// Pool virtual price, scaled by `VIRTUAL_PRICE_PRECISION`
    pub virtual_price: u64,
    /// `position` valued in base units at the virtual price (display only)
    pub base_value: u64,
}
