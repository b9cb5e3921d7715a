//! In-memory collaborators for exercising the vault without a cluster.
//!
//! All three share a [`MockWallet`] standing in for the vault-owned token
//! accounts. Reported amounts go through the same balance-delta check the CPI
//! adapters apply, so a collaborator that misreports what it moved fails the
//! call exactly as it would on-chain.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anchor_lang::prelude::*;

use crate::adapters::check_moved;
use crate::constants::VIRTUAL_PRICE_PRECISION;
use crate::engine::{ledger, processor};
use crate::interfaces::{Collaborators, GaugeInterface, PoolInterface, SwapInterface};
use crate::math::mul_div;
use crate::state::{DepositReceipt, HarvestRecord, ShareBalance, Vault, WithdrawReceipt};

/// Custom program error a mock returns when told to revert.
pub const MOCK_REVERT: u32 = 0xfa11;

pub const BPS: u64 = 10_000;

fn revert<T>() -> Result<T> {
    Err(ProgramError::Custom(MOCK_REVERT).into())
}

fn debit(balance: &mut u64, amount: u64) -> Result<()> {
    match balance.checked_sub(amount) {
        Some(rest) => {
            *balance = rest;
            Ok(())
        }
        None => Err(ProgramError::InsufficientFunds.into()),
    }
}

/// Token balances held by the vault outside the gauge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockWallet {
    pub base: u64,
    pub pool_tokens: u64,
    pub rewards: u64,
}

pub type SharedWallet = Rc<RefCell<MockWallet>>;

#[derive(Clone, Debug)]
pub struct MockPool {
    pub wallet: SharedWallet,
    /// Pool tokens minted per `BPS` base deposited
    pub mint_rate_bps: u64,
    /// Base paid per `BPS` pool tokens burned
    pub redeem_rate_bps: u64,
    pub virtual_price: u64,
    /// Amount reported as minted instead of the amount actually minted
    pub reported_mint: Option<u64>,
    pub fail_deposit: bool,
    pub fail_withdraw: bool,
    pub fail_virtual_price: bool,
}

impl MockPool {
    pub fn new(wallet: SharedWallet) -> Self {
        Self {
            wallet,
            mint_rate_bps: BPS,
            redeem_rate_bps: BPS,
            virtual_price: VIRTUAL_PRICE_PRECISION,
            reported_mint: None,
            fail_deposit: false,
            fail_withdraw: false,
            fail_virtual_price: false,
        }
    }
}

impl PoolInterface for MockPool {
    fn deposit_base(&mut self, amount: u64) -> Result<u64> {
        if self.fail_deposit {
            return revert();
        }
        let minted = mul_div(amount, self.mint_rate_bps, BPS)?;
        let mut wallet = self.wallet.borrow_mut();
        debit(&mut wallet.base, amount)?;
        let before = wallet.pool_tokens;
        wallet.pool_tokens += minted;

        let reported = self.reported_mint.unwrap_or(minted);
        check_moved("pool.deposit", before, wallet.pool_tokens, reported, true)?;
        Ok(reported)
    }

    fn withdraw_base(&mut self, pool_tokens: u64) -> Result<u64> {
        if self.fail_withdraw {
            return revert();
        }
        let paid = mul_div(pool_tokens, self.redeem_rate_bps, BPS)?;
        let mut wallet = self.wallet.borrow_mut();
        debit(&mut wallet.pool_tokens, pool_tokens)?;
        wallet.base += paid;
        Ok(paid)
    }

    fn virtual_price(&self) -> Result<u64> {
        if self.fail_virtual_price {
            return revert();
        }
        Ok(self.virtual_price)
    }
}

#[derive(Clone, Debug)]
pub struct MockGauge {
    pub wallet: SharedWallet,
    pub staked: u64,
    pub claimable: u64,
    /// Staked balance reported instead of the real one
    pub reported_staked: Option<u64>,
    pub fail_stake: bool,
    pub fail_unstake: bool,
    pub fail_claim: bool,
    pub fail_query: bool,
    /// Number of `claim_rewards` calls served
    pub claims: u32,
}

impl MockGauge {
    pub fn new(wallet: SharedWallet) -> Self {
        Self {
            wallet,
            staked: 0,
            claimable: 0,
            reported_staked: None,
            fail_stake: false,
            fail_unstake: false,
            fail_claim: false,
            fail_query: false,
            claims: 0,
        }
    }

    /// Accrues `rewards` claimable by the vault.
    pub fn accrue(&mut self, rewards: u64) {
        self.claimable += rewards;
    }
}

impl GaugeInterface for MockGauge {
    fn stake(&mut self, pool_tokens: u64) -> Result<()> {
        if self.fail_stake {
            return revert();
        }
        debit(&mut self.wallet.borrow_mut().pool_tokens, pool_tokens)?;
        self.staked += pool_tokens;
        Ok(())
    }

    fn unstake(&mut self, pool_tokens: u64) -> Result<()> {
        if self.fail_unstake {
            return revert();
        }
        debit(&mut self.staked, pool_tokens)?;
        self.wallet.borrow_mut().pool_tokens += pool_tokens;
        Ok(())
    }

    fn staked_balance(&self, _holder: &Pubkey) -> Result<u64> {
        if self.fail_query {
            return revert();
        }
        Ok(self.reported_staked.unwrap_or(self.staked))
    }

    fn claimable_rewards(&self, _holder: &Pubkey) -> Result<u64> {
        if self.fail_query {
            return revert();
        }
        Ok(self.claimable)
    }

    fn claim_rewards(&mut self, _holder: &Pubkey) -> Result<u64> {
        if self.fail_claim {
            return revert();
        }
        self.claims += 1;
        let claimed = std::mem::take(&mut self.claimable);
        self.wallet.borrow_mut().rewards += claimed;
        Ok(claimed)
    }
}

#[derive(Clone, Debug)]
pub struct MockSwap {
    pub wallet: SharedWallet,
    /// Pool tokens produced per `BPS` reward tokens
    pub rate_bps: u64,
    /// Amount reported as produced instead of the amount actually produced
    pub reported_out: Option<u64>,
    pub fail: bool,
}

impl MockSwap {
    pub fn new(wallet: SharedWallet) -> Self {
        Self {
            wallet,
            rate_bps: BPS,
            reported_out: None,
            fail: false,
        }
    }
}

impl SwapInterface for MockSwap {
    fn swap(&mut self, reward_amount: u64) -> Result<u64> {
        if self.fail {
            return revert();
        }
        let out = mul_div(reward_amount, self.rate_bps, BPS)?;
        let mut wallet = self.wallet.borrow_mut();
        debit(&mut wallet.rewards, reward_amount)?;
        let before = wallet.pool_tokens;
        wallet.pool_tokens += out;

        let reported = self.reported_out.unwrap_or(out);
        check_moved("swap", before, wallet.pool_tokens, reported, true)?;
        Ok(reported)
    }
}

pub type MockCollaborators = Collaborators<MockPool, MockGauge, MockSwap>;

/// 1:1 pool, 1:1 swap, nothing accrued.
pub fn mock_collaborators(vault: Pubkey) -> MockCollaborators {
    let wallet = SharedWallet::default();
    Collaborators::new(
        vault,
        MockPool::new(wallet.clone()),
        MockGauge::new(wallet.clone()),
        MockSwap::new(wallet),
    )
}

impl MockCollaborators {
    pub fn wallet(&self) -> MockWallet {
        self.pool.wallet.borrow().clone()
    }

    /// Credits base tokens to the vault, as the deposit transfer would.
    pub fn fund_base(&self, amount: u64) {
        self.pool.wallet.borrow_mut().base += amount;
    }

    /// Pays out base held by the vault, as the withdrawal transfer would.
    pub fn pay_out_base(&self, amount: u64) -> Result<()> {
        debit(&mut self.pool.wallet.borrow_mut().base, amount)
    }
}

/// A vault driven entirely in memory.
///
/// Does what the instruction handlers do around the core: funds the base
/// account before a deposit, creates share balances on first deposit, closes
/// them at zero, and pays out redeemed base. A failed operation also reverts
/// the collaborators, as the runtime reverts every account a failed
/// transaction touched.
pub struct MockVault {
    pub key: Pubkey,
    pub vault: Vault,
    pub holders: BTreeMap<Pubkey, ShareBalance>,
    pub ext: MockCollaborators,
    /// Base paid out to each owner across all withdrawals
    pub paid_out: BTreeMap<Pubkey, u64>,
}

impl Default for MockVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVault {
    pub fn new() -> Self {
        let key = Pubkey::new_unique();
        Self {
            key,
            vault: Vault::default(),
            holders: BTreeMap::new(),
            ext: mock_collaborators(key),
            paid_out: BTreeMap::new(),
        }
    }

    fn take_holder(&mut self, owner: Pubkey) -> ShareBalance {
        self.holders.remove(&owner).unwrap_or_else(|| ShareBalance {
            vault: self.key,
            owner,
            ..ShareBalance::default()
        })
    }

    fn put_holder(&mut self, holder: ShareBalance) {
        if holder.amount > 0 {
            self.holders.insert(holder.owner, holder);
        }
    }

    fn transaction<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let wallet = self.ext.wallet();
        let pool = self.ext.pool.clone();
        let gauge = self.ext.gauge.clone();
        let swap = self.ext.swap.clone();

        let result = op(self);
        if result.is_err() {
            *self.ext.pool.wallet.borrow_mut() = wallet;
            self.ext.pool = pool;
            self.ext.gauge = gauge;
            self.ext.swap = swap;
        }
        result
    }

    pub fn deposit(&mut self, owner: Pubkey, base_amount: u64) -> Result<DepositReceipt> {
        self.deposit_with_min(owner, base_amount, 0)
    }

    pub fn deposit_with_min(
        &mut self,
        owner: Pubkey,
        base_amount: u64,
        min_shares_out: u64,
    ) -> Result<DepositReceipt> {
        self.transaction(|sim| {
            let mut holder = sim.take_holder(owner);
            sim.ext.fund_base(base_amount);
            let result = processor::deposit(
                &mut sim.vault,
                &mut holder,
                &mut sim.ext,
                base_amount,
                min_shares_out,
            );
            sim.put_holder(holder);
            result
        })
    }

    pub fn withdraw(&mut self, owner: Pubkey, shares: u64) -> Result<WithdrawReceipt> {
        self.withdraw_with_min(owner, shares, 0)
    }

    pub fn withdraw_with_min(
        &mut self,
        owner: Pubkey,
        shares: u64,
        min_base_out: u64,
    ) -> Result<WithdrawReceipt> {
        self.transaction(|sim| {
            let mut holder = sim.take_holder(owner);
            let result = processor::withdraw(
                &mut sim.vault,
                &mut holder,
                &mut sim.ext,
                shares,
                min_base_out,
            );
            sim.put_holder(holder);

            let receipt = result?;
            sim.ext.pay_out_base(receipt.base_returned)?;
            *sim.paid_out.entry(owner).or_default() += receipt.base_returned;
            Ok(receipt)
        })
    }

    pub fn harvest(&mut self) -> Result<HarvestRecord> {
        self.transaction(|sim| processor::harvest(&mut sim.vault, &mut sim.ext))
    }

    pub fn balance_of(&self, owner: &Pubkey) -> u64 {
        self.holders.get(owner).map_or(0, |holder| holder.amount)
    }

    pub fn value_of(&self, owner: &Pubkey) -> Result<u64> {
        match self.holders.get(owner) {
            Some(holder) => ledger::value_of(&self.vault, holder),
            None => Ok(0),
        }
    }
}
