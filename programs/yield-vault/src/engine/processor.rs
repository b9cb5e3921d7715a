//! Vault operations composed from the ledger, position manager and harvest engine.
//!
//! Each operation snapshots the ledger before touching any collaborator and
//! restores the snapshot if any step fails, so a failed call leaves totals and
//! balances exactly as they were. On-chain the runtime already discards a
//! failed instruction; the snapshot gives the same guarantee off-chain.

use anchor_lang::prelude::*;

use crate::engine::{harvest, ledger, position};
use crate::error::VaultError;
use crate::interfaces::{Collaborators, GaugeInterface, PoolInterface, SwapInterface};
use crate::state::{DepositReceipt, HarvestRecord, ShareBalance, Vault, WithdrawReceipt};

fn with_rollback<T>(
    vault: &mut Vault,
    holder: &mut ShareBalance,
    op: impl FnOnce(&mut Vault, &mut ShareBalance) -> Result<T>,
) -> Result<T> {
    let vault_snapshot = vault.clone();
    let holder_snapshot = holder.clone();

    let result = op(vault, holder);
    if result.is_err() {
        *vault = vault_snapshot;
        *holder = holder_snapshot;
    }
    result
}

/// Harvests first when the vault compounds on every entry and exit.
fn compound<P, G, S>(
    vault: &mut Vault,
    ext: &mut Collaborators<P, G, S>,
) -> Result<Option<HarvestRecord>>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    if !vault.auto_compound {
        return Ok(None);
    }
    harvest::harvest(vault, ext).map(Some)
}

/// Converts `base_amount` into staked position and credits `holder` with shares.
///
/// The base units must already sit in the vault's base account.
pub fn deposit<P, G, S>(
    vault: &mut Vault,
    holder: &mut ShareBalance,
    ext: &mut Collaborators<P, G, S>,
    base_amount: u64,
    min_shares_out: u64,
) -> Result<DepositReceipt>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    with_rollback(vault, holder, |vault, holder| {
        let harvest = compound(vault, ext)?;

        let position_gained = position::deposit_base(vault, ext, base_amount)?;
        let shares_minted = ledger::mint(vault, holder, position_gained)?;
        require!(
            shares_minted >= min_shares_out,
            VaultError::SlippageExceeded
        );

        position::verify_custody(vault, ext)?;

        msg!(
            "Deposited {} base as {} position for {} shares",
            base_amount,
            position_gained,
            shares_minted
        );

        Ok(DepositReceipt {
            base_amount,
            position_gained,
            shares_minted,
            harvest,
        })
    })
}

/// Burns `shares` from `holder` and redeems the released position for base.
///
/// The base units land in the vault's base account for the caller to pay out.
pub fn withdraw<P, G, S>(
    vault: &mut Vault,
    holder: &mut ShareBalance,
    ext: &mut Collaborators<P, G, S>,
    shares: u64,
    min_base_out: u64,
) -> Result<WithdrawReceipt>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    with_rollback(vault, holder, |vault, holder| {
        let harvest = compound(vault, ext)?;

        let position_released = ledger::burn(vault, holder, shares)?;
        let base_returned = position::withdraw_to_base(vault, ext, position_released)?;
        require!(base_returned >= min_base_out, VaultError::SlippageExceeded);

        position::verify_custody(vault, ext)?;

        msg!(
            "Withdrew {} shares as {} position for {} base",
            shares,
            position_released,
            base_returned
        );

        Ok(WithdrawReceipt {
            shares_burned: shares,
            position_released,
            base_returned,
            harvest,
        })
    })
}

/// Permissionless: claims rewards and compounds them into the position.
pub fn harvest<P, G, S>(
    vault: &mut Vault,
    ext: &mut Collaborators<P, G, S>,
) -> Result<HarvestRecord>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    let snapshot = vault.clone();

    let result = harvest::harvest(vault, ext).and_then(|record| {
        position::verify_custody(vault, ext)?;
        Ok(record)
    });
    if result.is_err() {
        *vault = snapshot;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EXCHANGE_RATE_PRECISION;
    use crate::mock::{MockVault, BPS};
    use crate::test_utils::error_code;

    fn assert_solvent(sim: &MockVault) {
        let held: u64 = sim.holders.values().map(|holder| holder.amount).sum();
        assert_eq!(held, sim.vault.total_shares);
        assert!(sim.ext.gauge.staked >= sim.vault.total_pool_position);
        assert!(sim.holders.values().all(|holder| holder.amount > 0));
    }

    #[test]
    fn test_concrete_scenario() {
        let mut sim = MockVault::new();
        let user = Pubkey::new_unique();
        sim.ext.pool.mint_rate_bps = 9_500;

        // 100 base -> 95 position -> 95 shares (position-unit bootstrap)
        let receipt = sim.deposit(user, 100).unwrap();
        assert_eq!(receipt.position_gained, 95);
        assert_eq!(receipt.shares_minted, 95);
        assert_eq!(sim.vault.total_shares, 95);
        assert_eq!(sim.vault.total_pool_position, 95);

        // rewards convert into 5 more position units
        sim.ext.gauge.accrue(5);
        let record = sim.harvest().unwrap();
        assert_eq!(record.position_gained, 5);
        assert_eq!(sim.vault.total_pool_position, 100);
        assert_eq!(sim.vault.total_shares, 95);
        let rate = ledger::exchange_rate(&sim.vault).unwrap();
        assert_eq!(rate, 1_052_631_578);
        assert!(rate > EXCHANGE_RATE_PRECISION);

        // all 95 shares redeem all 100 units, less 1% pool slippage
        sim.ext.pool.redeem_rate_bps = 9_900;
        let receipt = sim.withdraw(user, 95).unwrap();
        assert_eq!(receipt.position_released, 100);
        assert_eq!(receipt.base_returned, 99);
        assert_eq!(sim.vault.total_shares, 0);
        assert_eq!(sim.vault.total_pool_position, 0);
        assert!(!sim.holders.contains_key(&user));
        assert_eq!(sim.paid_out[&user], 99);
    }

    #[test]
    fn test_zero_state_bootstrap() {
        let mut sim = MockVault::new();
        let user = Pubkey::new_unique();

        sim.deposit(user, 1_000).unwrap();
        assert_eq!(sim.holders[&user].amount, 1_000);
        assert_eq!(sim.value_of(&user).unwrap(), 1_000);
    }

    #[test]
    fn test_round_trip_returns_at_most_deposit() {
        let mut sim = MockVault::new();
        let whale = Pubkey::new_unique();
        let user = Pubkey::new_unique();
        sim.deposit(whale, 1_000_003).unwrap();
        sim.ext.gauge.accrue(333_331);
        sim.harvest().unwrap();

        let shares_before = sim.vault.total_shares;
        let position_before = sim.vault.total_pool_position;

        let minted = sim.deposit(user, 777).unwrap().shares_minted;
        let returned = sim.withdraw(user, minted).unwrap().base_returned;

        assert!(returned <= 777);
        assert_eq!(sim.vault.total_shares, shares_before);
        // floor residue stays behind for the remaining holders
        let residue = sim.vault.total_pool_position - position_before;
        assert_eq!(returned + residue, 777);
    }

    #[test]
    fn test_harvest_never_dilutes_and_rate_never_drops() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        sim.deposit(alice, 500).unwrap();
        sim.deposit(bob, 250).unwrap();

        for rewards in [0, 1, 7, 0, 1_000] {
            let shares = sim.vault.total_shares;
            let rate = ledger::exchange_rate(&sim.vault).unwrap();
            sim.ext.gauge.accrue(rewards);
            sim.harvest().unwrap();
            assert_eq!(sim.vault.total_shares, shares);
            assert!(ledger::exchange_rate(&sim.vault).unwrap() >= rate);
        }

        let a = sim.value_of(&alice).unwrap();
        let b = sim.value_of(&bob).unwrap();
        assert!(a.abs_diff(2 * b) <= 1);
        assert_solvent(&sim);
    }

    #[test]
    fn test_failed_stake_leaves_ledger_untouched() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();
        let vault_before = sim.vault.clone();
        let alice_before = sim.holders[&alice].clone();

        sim.ext.gauge.fail_stake = true;
        assert_eq!(
            error_code(sim.deposit(alice, 50)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault, vault_before);
        assert_eq!(sim.holders[&alice], alice_before);
    }

    #[test]
    fn test_failed_redeem_leaves_ledger_untouched() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();
        let vault_before = sim.vault.clone();

        sim.ext.pool.fail_withdraw = true;
        assert_eq!(
            error_code(sim.withdraw(alice, 100)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault, vault_before);
        assert_eq!(sim.holders[&alice].amount, 100);
    }

    #[test]
    fn test_lying_gauge_rolls_back_harvest() {
        let mut sim = MockVault::new();
        sim.deposit(Pubkey::new_unique(), 100).unwrap();
        sim.ext.gauge.accrue(10);
        sim.ext.gauge.reported_staked = Some(50);

        assert_eq!(
            error_code(sim.harvest()),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault.total_pool_position, 100);
    }

    #[test]
    fn test_withdraw_preconditions() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();

        assert_eq!(
            error_code(sim.withdraw(alice, 101)),
            u32::from(VaultError::InsufficientShares)
        );
        assert_eq!(
            error_code(sim.withdraw(alice, 0)),
            u32::from(VaultError::ZeroAmount)
        );
        assert_eq!(
            error_code(sim.deposit(alice, 0)),
            u32::from(VaultError::ZeroAmount)
        );
    }

    #[test]
    fn test_slippage_bounds() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.ext.pool.mint_rate_bps = 9_000;

        assert_eq!(
            error_code(sim.deposit_with_min(alice, 100, 91)),
            u32::from(VaultError::SlippageExceeded)
        );
        assert_eq!(sim.vault.total_shares, 0);
        sim.deposit_with_min(alice, 100, 90).unwrap();

        sim.ext.pool.redeem_rate_bps = BPS / 2;
        assert_eq!(
            error_code(sim.withdraw_with_min(alice, 90, 46)),
            u32::from(VaultError::SlippageExceeded)
        );
        assert_eq!(sim.withdraw_with_min(alice, 90, 45).unwrap().base_returned, 45);
    }

    #[test]
    fn test_auto_compound_harvests_before_new_deposit() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        sim.vault.auto_compound = true;
        sim.deposit(alice, 100).unwrap();
        sim.ext.gauge.accrue(100);

        // bob buys in after alice's rewards are folded in: 100 units for 50 shares
        let receipt = sim.deposit(bob, 100).unwrap();
        assert_eq!(receipt.harvest.unwrap().position_gained, 100);
        assert_eq!(receipt.shares_minted, 50);
        assert_eq!(sim.value_of(&alice).unwrap(), 200);
        assert_eq!(sim.value_of(&bob).unwrap(), 100);
    }

    #[test]
    fn test_without_auto_compound_deposit_skips_harvest() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();
        sim.ext.gauge.accrue(100);

        let receipt = sim.deposit(alice, 100).unwrap();
        assert!(receipt.harvest.is_none());
        assert_eq!(sim.ext.gauge.claims, 0);
        assert_eq!(sim.vault.total_pool_position, 200);
    }

    #[test]
    fn test_dust_is_absorbed_by_next_bootstrap() {
        let mut sim = MockVault::new();
        sim.ext.gauge.accrue(3);
        sim.harvest().unwrap();
        assert_eq!(sim.vault.total_pool_position, 3);
        assert_eq!(sim.vault.total_shares, 0);

        let user = Pubkey::new_unique();
        assert_eq!(sim.deposit(user, 10).unwrap().shares_minted, 10);
        assert_eq!(sim.value_of(&user).unwrap(), 13);
    }

    #[test]
    fn test_mixed_sequence_stays_solvent() {
        let mut sim = MockVault::new();
        let users: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        sim.ext.pool.mint_rate_bps = 9_731;
        sim.ext.pool.redeem_rate_bps = 10_113;
        sim.ext.swap.rate_bps = 4_219;

        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        for step in 0..400u64 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let user = users[(seed % 4) as usize];
            match step % 3 {
                0 => {
                    let _ = sim.deposit(user, 1 + seed % 10_000);
                }
                1 => {
                    let held = sim.holders.get(&user).map_or(0, |h| h.amount);
                    if held > 0 {
                        let position_before = sim.vault.total_pool_position;
                        if let Ok(receipt) = sim.withdraw(user, 1 + seed % held) {
                            assert!(receipt.position_released <= position_before);
                        }
                    }
                }
                _ => {
                    sim.ext.gauge.accrue(seed % 500);
                    sim.harvest().unwrap();
                }
            }
            assert_solvent(&sim);
        }
    }

    #[test]
    fn test_underreporting_pool_rolls_back_deposit() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();
        let vault_before = sim.vault.clone();

        sim.ext.pool.reported_mint = Some(1);
        assert_eq!(
            error_code(sim.deposit(alice, 50)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault, vault_before);
        assert_eq!(sim.holders[&alice].amount, 100);
        // nothing left stranded outside the gauge
        assert_eq!(sim.ext.wallet().pool_tokens, 0);
        assert_eq!(sim.ext.gauge.staked, 100);
    }

    #[test]
    fn test_failed_pool_deposit_leaves_ledger_untouched() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();
        let vault_before = sim.vault.clone();

        sim.ext.pool.fail_deposit = true;
        assert_eq!(
            error_code(sim.deposit(alice, 50)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault, vault_before);
        assert_eq!(sim.holders[&alice].amount, 100);
    }

    #[test]
    fn test_failed_claim_rolls_back_harvest_and_compounding_entry() {
        let mut sim = MockVault::new();
        let alice = Pubkey::new_unique();
        sim.deposit(alice, 100).unwrap();
        sim.ext.gauge.accrue(10);
        sim.ext.gauge.fail_claim = true;
        let vault_before = sim.vault.clone();

        assert_eq!(
            error_code(sim.harvest()),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault, vault_before);

        // with compounding on, the claim failure blocks entry and exit too
        sim.vault.auto_compound = true;
        let vault_before = sim.vault.clone();
        assert_eq!(
            error_code(sim.deposit(alice, 50)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(
            error_code(sim.withdraw(alice, 10)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(sim.vault, vault_before);
        assert_eq!(sim.holders[&alice].amount, 100);
        assert_eq!(sim.ext.gauge.claimable, 10);
    }
}
