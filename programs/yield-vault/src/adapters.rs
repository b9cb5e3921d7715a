//! Collaborator interfaces backed by cross-program invocations.
//!
//! Collaborator instructions are addressed by their sighash
//! (`sha256("global:<name>")[..8]`) followed by little-endian `u64` arguments.
//! Accounts are passed as `[vault (signer), state (mut), token accounts (mut)..., token program]`.
//! Amounts come back as 8 bytes of return data from the invoked program.
//!
//! A reported amount is never taken on trust: each adapter reads the balances
//! of the vault-owned token accounts around the call and fails unless they
//! moved by exactly what the collaborator reported.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::{
    hash::hash,
    instruction::Instruction,
    program::{get_return_data, invoke_signed, set_return_data},
};
use anchor_spl::token::accessor::amount;
use anchor_spl::token_interface::{TokenAccount, TokenInterface};

use crate::constants::{SIGHASH_NAMESPACE, VAULT_SEED};
use crate::error::VaultError;
use crate::interfaces::{Collaborators, GaugeInterface, PoolInterface, SwapInterface};
use crate::state::Vault;

pub fn sighash(name: &str) -> [u8; 8] {
    let preimage = format!("{}:{}", SIGHASH_NAMESPACE, name);
    let mut discriminator = [0u8; 8];
    discriminator.copy_from_slice(&hash(preimage.as_bytes()).to_bytes()[..8]);
    discriminator
}

pub fn instruction_data(name: &str, args: &[u64]) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + 8 * args.len());
    data.extend_from_slice(&sighash(name));
    for arg in args {
        data.extend_from_slice(&arg.to_le_bytes());
    }
    data
}

/// Decodes a `u64` returned by `program`.
pub fn decode_return(program: &Pubkey, returned: Option<(Pubkey, Vec<u8>)>) -> Result<u64> {
    let (returned_by, data) = returned.ok_or_else(|| {
        msg!("No return data from {}", program);
        error!(VaultError::ExternalCallFailed)
    })?;
    require_keys_eq!(returned_by, *program, VaultError::ExternalCallFailed);

    let bytes: [u8; 8] = data.as_slice().try_into().map_err(|_| {
        msg!("Expected 8 bytes of return data, got {}", data.len());
        error!(VaultError::ExternalCallFailed)
    })?;
    Ok(u64::from_le_bytes(bytes))
}

/// Fails unless a token balance went from `before` to `after` by exactly
/// `expected`, in the direction given.
pub fn check_moved(call: &str, before: u64, after: u64, expected: u64, credit: bool) -> Result<()> {
    let moved = if credit {
        after.checked_sub(before)
    } else {
        before.checked_sub(after)
    };
    if moved != Some(expected) {
        msg!(
            "{} reported {} but balance went from {} to {}",
            call,
            expected,
            before,
            after
        );
        return err!(VaultError::ExternalCallFailed);
    }
    Ok(())
}

/// The vault PDA, able to sign for its own token accounts and stake.
#[derive(Clone)]
pub struct VaultSigner<'info> {
    pub vault: AccountInfo<'info>,
    seeds: Vec<Vec<u8>>,
}

impl<'info> VaultSigner<'info> {
    pub fn new(vault: AccountInfo<'info>, state: &Vault) -> Self {
        let seeds = vec![
            VAULT_SEED.to_vec(),
            state.base_mint.to_bytes().to_vec(),
            state.vault_id.to_le_bytes().to_vec(),
            vec![state.bump],
        ];
        Self { vault, seeds }
    }

    pub fn key(&self) -> Pubkey {
        self.vault.key()
    }

    pub fn with_seeds<T>(&self, f: impl FnOnce(&[&[&[u8]]]) -> T) -> T {
        let seeds: Vec<&[u8]> = self.seeds.iter().map(Vec::as_slice).collect();
        f(&[seeds.as_slice()])
    }

    /// Invokes `name` on `program` with the vault as signer.
    fn invoke_unit(
        &self,
        program: &AccountInfo<'info>,
        state: &AccountInfo<'info>,
        token_accounts: &[&AccountInfo<'info>],
        token_program: &AccountInfo<'info>,
        name: &str,
        args: &[u64],
    ) -> Result<()> {
        let mut metas = vec![
            AccountMeta::new_readonly(self.vault.key(), true),
            AccountMeta::new(state.key(), false),
        ];
        metas.extend(
            token_accounts
                .iter()
                .map(|account| AccountMeta::new(account.key(), false)),
        );
        metas.push(AccountMeta::new_readonly(token_program.key(), false));

        let ix = Instruction {
            program_id: program.key(),
            accounts: metas,
            data: instruction_data(name, args),
        };

        let mut infos = vec![self.vault.clone(), state.clone()];
        infos.extend(token_accounts.iter().map(|account| (*account).clone()));
        infos.push(token_program.clone());
        infos.push(program.clone());

        self.with_seeds(|signer_seeds| invoke_signed(&ix, &infos, signer_seeds))?;
        Ok(())
    }

    /// Like `invoke_unit`, returning the `u64` the collaborator reported.
    fn invoke(
        &self,
        program: &AccountInfo<'info>,
        state: &AccountInfo<'info>,
        token_accounts: &[&AccountInfo<'info>],
        token_program: &AccountInfo<'info>,
        name: &str,
        args: &[u64],
    ) -> Result<u64> {
        // stale data from an earlier call must not pass for this one's
        set_return_data(&[]);
        self.invoke_unit(program, state, token_accounts, token_program, name, args)?;
        decode_return(program.key, get_return_data())
    }
}

pub struct PoolCpi<'info> {
    pub signer: VaultSigner<'info>,
    pub program: AccountInfo<'info>,
    pub state: AccountInfo<'info>,
    pub base_vault: AccountInfo<'info>,
    pub pool_vault: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
}

impl<'info> PoolCpi<'info> {
    fn call(&self, name: &str, args: &[u64]) -> Result<u64> {
        self.signer.invoke(
            &self.program,
            &self.state,
            &[&self.base_vault, &self.pool_vault],
            &self.token_program,
            name,
            args,
        )
    }
}

impl<'info> PoolInterface for PoolCpi<'info> {
    fn deposit_base(&mut self, base_amount: u64) -> Result<u64> {
        let base_before = amount(&self.base_vault)?;
        let pool_before = amount(&self.pool_vault)?;

        let minted = self.call("deposit", &[base_amount])?;

        check_moved("pool.deposit", base_before, amount(&self.base_vault)?, base_amount, false)?;
        check_moved("pool.deposit", pool_before, amount(&self.pool_vault)?, minted, true)?;
        Ok(minted)
    }

    fn withdraw_base(&mut self, pool_tokens: u64) -> Result<u64> {
        let base_before = amount(&self.base_vault)?;
        let pool_before = amount(&self.pool_vault)?;

        let paid = self.call("withdraw", &[pool_tokens])?;

        check_moved("pool.withdraw", pool_before, amount(&self.pool_vault)?, pool_tokens, false)?;
        check_moved("pool.withdraw", base_before, amount(&self.base_vault)?, paid, true)?;
        Ok(paid)
    }

    fn virtual_price(&self) -> Result<u64> {
        self.call("virtual_price", &[])
    }
}

pub struct GaugeCpi<'info> {
    pub signer: VaultSigner<'info>,
    pub program: AccountInfo<'info>,
    pub state: AccountInfo<'info>,
    pub pool_vault: AccountInfo<'info>,
    pub reward_vault: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
}

impl<'info> GaugeCpi<'info> {
    fn token_accounts(&self) -> [&AccountInfo<'info>; 2] {
        [&self.pool_vault, &self.reward_vault]
    }

    /// Gauge queries are answered for the signing vault only.
    fn query(&self, holder: &Pubkey, name: &str) -> Result<u64> {
        require_keys_eq!(*holder, self.signer.key(), VaultError::InvalidCollaborator);
        self.signer.invoke(
            &self.program,
            &self.state,
            &self.token_accounts(),
            &self.token_program,
            name,
            &[],
        )
    }
}

impl<'info> GaugeInterface for GaugeCpi<'info> {
    fn stake(&mut self, pool_tokens: u64) -> Result<()> {
        let before = amount(&self.pool_vault)?;
        self.signer.invoke_unit(
            &self.program,
            &self.state,
            &self.token_accounts(),
            &self.token_program,
            "stake",
            &[pool_tokens],
        )?;
        check_moved("gauge.stake", before, amount(&self.pool_vault)?, pool_tokens, false)
    }

    fn unstake(&mut self, pool_tokens: u64) -> Result<()> {
        let before = amount(&self.pool_vault)?;
        self.signer.invoke_unit(
            &self.program,
            &self.state,
            &self.token_accounts(),
            &self.token_program,
            "unstake",
            &[pool_tokens],
        )?;
        check_moved("gauge.unstake", before, amount(&self.pool_vault)?, pool_tokens, true)
    }

    fn staked_balance(&self, holder: &Pubkey) -> Result<u64> {
        self.query(holder, "staked_balance")
    }

    fn claimable_rewards(&self, holder: &Pubkey) -> Result<u64> {
        self.query(holder, "claimable_rewards")
    }

    fn claim_rewards(&mut self, holder: &Pubkey) -> Result<u64> {
        let before = amount(&self.reward_vault)?;
        let claimed = self.query(holder, "claim_rewards")?;
        check_moved("gauge.claim_rewards", before, amount(&self.reward_vault)?, claimed, true)?;
        Ok(claimed)
    }
}

pub struct SwapCpi<'info> {
    pub signer: VaultSigner<'info>,
    pub program: AccountInfo<'info>,
    pub state: AccountInfo<'info>,
    pub reward_vault: AccountInfo<'info>,
    pub pool_vault: AccountInfo<'info>,
    pub token_program: AccountInfo<'info>,
}

impl<'info> SwapInterface for SwapCpi<'info> {
    fn swap(&mut self, reward_amount: u64) -> Result<u64> {
        let reward_before = amount(&self.reward_vault)?;
        let pool_before = amount(&self.pool_vault)?;

        let out = self.signer.invoke(
            &self.program,
            &self.state,
            &[&self.reward_vault, &self.pool_vault],
            &self.token_program,
            "swap",
            &[reward_amount],
        )?;

        check_moved("swap", reward_before, amount(&self.reward_vault)?, reward_amount, false)?;
        check_moved("swap", pool_before, amount(&self.pool_vault)?, out, true)?;
        Ok(out)
    }
}

pub type CpiCollaborators<'info> = Collaborators<PoolCpi<'info>, GaugeCpi<'info>, SwapCpi<'info>>;

/// Collaborator programs, their state and the vault-owned token accounts they
/// move funds through. Checked against the bindings stored in the vault.
#[derive(Accounts)]
pub struct VaultCollaborators<'info> {
    /// CHECK: matched against vault.pool_program
    #[account(executable)]
    pub pool_program: UncheckedAccount<'info>,

    /// CHECK: matched against vault.pool_state, owned by the pool program
    #[account(mut)]
    pub pool_state: UncheckedAccount<'info>,

    /// CHECK: matched against vault.gauge_program
    #[account(executable)]
    pub gauge_program: UncheckedAccount<'info>,

    /// CHECK: matched against vault.gauge_state, owned by the gauge program
    #[account(mut)]
    pub gauge_state: UncheckedAccount<'info>,

    /// CHECK: matched against vault.swap_program
    #[account(executable)]
    pub swap_program: UncheckedAccount<'info>,

    /// CHECK: matched against vault.swap_state, owned by the swap program
    #[account(mut)]
    pub swap_state: UncheckedAccount<'info>,

    #[account(mut)]
    pub base_vault: InterfaceAccount<'info, TokenAccount>,

    #[account(mut)]
    pub pool_vault: InterfaceAccount<'info, TokenAccount>,

    #[account(mut)]
    pub reward_vault: InterfaceAccount<'info, TokenAccount>,

    pub token_program: Interface<'info, TokenInterface>,
}

impl<'info> VaultCollaborators<'info> {
    pub fn validate(&self, vault: &Vault) -> Result<()> {
        let bindings = [
            (self.pool_program.key(), vault.pool_program),
            (self.pool_state.key(), vault.pool_state),
            (self.gauge_program.key(), vault.gauge_program),
            (self.gauge_state.key(), vault.gauge_state),
            (self.swap_program.key(), vault.swap_program),
            (self.swap_state.key(), vault.swap_state),
            (self.base_vault.key(), vault.base_vault),
            (self.pool_vault.key(), vault.pool_vault),
            (self.reward_vault.key(), vault.reward_vault),
        ];
        for (given, bound) in bindings {
            require_keys_eq!(given, bound, VaultError::InvalidCollaborator);
        }

        require_keys_eq!(
            *self.pool_state.owner,
            vault.pool_program,
            VaultError::InvalidCollaborator
        );
        require_keys_eq!(
            *self.gauge_state.owner,
            vault.gauge_program,
            VaultError::InvalidCollaborator
        );
        require_keys_eq!(
            *self.swap_state.owner,
            vault.swap_program,
            VaultError::InvalidCollaborator
        );
        Ok(())
    }

    /// Validates the accounts and binds them to `vault` as signer.
    pub fn bind(
        &self,
        vault_info: AccountInfo<'info>,
        vault: &Vault,
    ) -> Result<CpiCollaborators<'info>> {
        self.validate(vault)?;

        let signer = VaultSigner::new(vault_info, vault);
        let token_program = self.token_program.to_account_info();
        let base_vault = self.base_vault.to_account_info();
        let pool_vault = self.pool_vault.to_account_info();
        let reward_vault = self.reward_vault.to_account_info();

        Ok(Collaborators::new(
            signer.key(),
            PoolCpi {
                signer: signer.clone(),
                program: self.pool_program.to_account_info(),
                state: self.pool_state.to_account_info(),
                base_vault,
                pool_vault: pool_vault.clone(),
                token_program: token_program.clone(),
            },
            GaugeCpi {
                signer: signer.clone(),
                program: self.gauge_program.to_account_info(),
                state: self.gauge_state.to_account_info(),
                pool_vault: pool_vault.clone(),
                reward_vault: reward_vault.clone(),
                token_program: token_program.clone(),
            },
            SwapCpi {
                signer,
                program: self.swap_program.to_account_info(),
                state: self.swap_state.to_account_info(),
                reward_vault,
                pool_vault,
                token_program,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::error_code;

    #[test]
    fn test_sighash_matches_anchor_discriminator() {
        // sha256("global:redeem_reserve_collateral")[0..8]
        assert_eq!(
            sighash("redeem_reserve_collateral"),
            [234, 117, 181, 125, 185, 142, 220, 29]
        );
    }

    #[test]
    fn test_instruction_data_layout() {
        let data = instruction_data("stake", &[7, u64::MAX]);
        assert_eq!(data.len(), 24);
        assert_eq!(&data[..8], &sighash("stake"));
        assert_eq!(&data[8..16], &7u64.to_le_bytes());
        assert_eq!(&data[16..], &u64::MAX.to_le_bytes());
        assert_eq!(instruction_data("virtual_price", &[]).len(), 8);
    }

    #[test]
    fn test_decode_return() {
        let program = Pubkey::new_unique();
        let returned = Some((program, 95u64.to_le_bytes().to_vec()));
        assert_eq!(decode_return(&program, returned).unwrap(), 95);
    }

    #[test]
    fn test_decode_return_rejects_bad_data() {
        let program = Pubkey::new_unique();
        let failed = u32::from(VaultError::ExternalCallFailed);

        assert_eq!(error_code(decode_return(&program, None)), failed);
        // returned by some other program
        let other = Some((Pubkey::new_unique(), 95u64.to_le_bytes().to_vec()));
        assert_eq!(error_code(decode_return(&program, other)), failed);
        // wrong width
        let short = Some((program, vec![1, 2, 3]));
        assert_eq!(error_code(decode_return(&program, short)), failed);
    }

    #[test]
    fn test_check_moved() {
        assert!(check_moved("pool.deposit", 100, 0, 100, false).is_ok());
        assert!(check_moved("pool.deposit", 0, 95, 95, true).is_ok());

        let failed = u32::from(VaultError::ExternalCallFailed);
        // over-reported mint
        assert_eq!(error_code(check_moved("pool.deposit", 0, 95, 96, true)), failed);
        // balance moved the wrong way
        assert_eq!(error_code(check_moved("gauge.unstake", 10, 5, 5, true)), failed);
    }
}
