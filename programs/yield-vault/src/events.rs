use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub authority: Pubkey,
    pub base_mint: Pubkey,
    pub pool_mint: Pubkey,
    pub pool_program: Pubkey,
    pub gauge_program: Pubkey,
    pub swap_program: Pubkey,
    pub vault_id: u64,
    pub auto_compound: bool,
}

#[event]
pub struct Deposit {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub base_amount: u64,
    pub position_gained: u64,
    pub shares: u64,
}

#[event]
pub struct Withdraw {
    pub vault: Pubkey,
    pub owner: Pubkey,
    pub shares: u64,
    pub position_released: u64,
    pub base_returned: u64,
}

#[event]
pub struct Harvest {
    pub vault: Pubkey,
    pub caller: Pubkey,
    pub rewards_claimed: u64,
    pub position_gained: u64,
    pub total_pool_position: u64,
    pub exchange_rate: u64,
}

#[event]
pub struct AutoCompoundChanged {
    pub vault: Pubkey,
    pub enabled: bool,
}

#[event]
pub struct AuthorityTransferred {
    pub vault: Pubkey,
    pub previous_authority: Pubkey,
    pub new_authority: Pubkey,
}
