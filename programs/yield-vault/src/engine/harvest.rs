//! Harvest engine: folds gauge rewards back into the staked position.
//!
//! A harvest only ever grows `total_pool_position` and never touches the share
//! supply, so anyone may trigger it.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::interfaces::{external, Collaborators, GaugeInterface, PoolInterface, SwapInterface};
use crate::state::{HarvestRecord, Vault};

pub fn harvest<P, G, S>(
    vault: &mut Vault,
    ext: &mut Collaborators<P, G, S>,
) -> Result<HarvestRecord>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    let claimed = external("gauge.claim_rewards", ext.gauge.claim_rewards(&ext.vault))?;
    if claimed == 0 {
        return Ok(HarvestRecord {
            total_pool_position: vault.total_pool_position,
            ..HarvestRecord::default()
        });
    }

    let gained = external("swap.swap", ext.swap.swap(claimed))?;
    if gained > 0 {
        external("gauge.stake", ext.gauge.stake(gained))?;
        vault.total_pool_position = vault
            .total_pool_position
            .checked_add(gained)
            .ok_or(VaultError::MathOverflow)?;
    }

    msg!(
        "Harvested {} rewards into {} position, total {}",
        claimed,
        gained,
        vault.total_pool_position
    );

    Ok(HarvestRecord {
        rewards_claimed: claimed,
        position_gained: gained,
        total_pool_position: vault.total_pool_position,
    })
}

/// Rewards the gauge would pay the vault right now.
pub fn pending_rewards<P, G, S>(ext: &Collaborators<P, G, S>) -> Result<u64>
where
    P: PoolInterface,
    G: GaugeInterface,
    S: SwapInterface,
{
    external(
        "gauge.claimable_rewards",
        ext.gauge.claimable_rewards(&ext.vault),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::position;
    use crate::mock::mock_collaborators;
    use crate::test_utils::error_code;

    #[test]
    fn test_nothing_to_claim_is_a_noop() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());

        let record = harvest(&mut vault, &mut ext).unwrap();
        assert_eq!(record, HarvestRecord::default());
        // idempotent
        assert_eq!(harvest(&mut vault, &mut ext).unwrap(), record);
        assert_eq!(ext.gauge.claims, 2);
    }

    #[test]
    fn test_rewards_are_swapped_and_staked() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.fund_base(95);
        position::deposit_base(&mut vault, &mut ext, 95).unwrap();
        ext.gauge.accrue(10);
        ext.swap.rate_bps = 5_000;

        let record = harvest(&mut vault, &mut ext).unwrap();
        assert_eq!(record.rewards_claimed, 10);
        assert_eq!(record.position_gained, 5);
        assert_eq!(record.total_pool_position, 100);
        assert_eq!(ext.gauge.staked, 100);
        assert_eq!(ext.wallet().rewards, 0);
        assert_eq!(pending_rewards(&ext).unwrap(), 0);
    }

    #[test]
    fn test_worthless_swap_is_recorded_not_staked() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.gauge.accrue(3);
        ext.swap.rate_bps = 0;

        let record = harvest(&mut vault, &mut ext).unwrap();
        assert_eq!(record.rewards_claimed, 3);
        assert_eq!(record.position_gained, 0);
        assert_eq!(ext.gauge.staked, 0);
    }

    #[test]
    fn test_swap_failure_is_external_call_failed() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.gauge.accrue(3);
        ext.swap.fail = true;

        assert_eq!(
            error_code(harvest(&mut vault, &mut ext)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(vault.total_pool_position, 0);
    }

    #[test]
    fn test_overreported_swap_output_cannot_be_staked() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.gauge.accrue(3);
        ext.swap.reported_out = Some(300);

        assert_eq!(
            error_code(harvest(&mut vault, &mut ext)),
            u32::from(VaultError::ExternalCallFailed)
        );
    }

    #[test]
    fn test_underreported_swap_output_is_rejected() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.gauge.accrue(10);
        ext.swap.reported_out = Some(1);

        assert_eq!(
            error_code(harvest(&mut vault, &mut ext)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(vault.total_pool_position, 0);
        assert_eq!(ext.gauge.staked, 0);
    }

    #[test]
    fn test_failed_claim_is_external_call_failed() {
        let mut vault = Vault::default();
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.gauge.accrue(5);
        ext.gauge.fail_claim = true;

        assert_eq!(
            error_code(harvest(&mut vault, &mut ext)),
            u32::from(VaultError::ExternalCallFailed)
        );
        assert_eq!(vault.total_pool_position, 0);
        assert_eq!(ext.gauge.claimable, 5);
    }

    #[test]
    fn test_pending_rewards_reads_without_claiming() {
        let mut ext = mock_collaborators(Pubkey::new_unique());
        ext.gauge.accrue(42);

        assert_eq!(pending_rewards(&ext).unwrap(), 42);
        assert_eq!(ext.gauge.claims, 0);
        assert_eq!(ext.wallet().rewards, 0);

        ext.gauge.fail_query = true;
        assert_eq!(
            error_code(pending_rewards(&ext)),
            u32::from(VaultError::ExternalCallFailed)
        );
    }
}
