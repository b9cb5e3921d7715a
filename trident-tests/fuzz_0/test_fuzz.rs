use anchor_lang::prelude::Pubkey;
use rand::Rng;
use trident_fuzz::fuzzing::*;
use yield_vault::mock::{MockVault, BPS};
use yield_vault::state::{ShareBalance, Vault};

const HOLDERS: usize = 4;

/// Ledger snapshot taken before an operation, compared after a failed one
#[derive(Clone, PartialEq, Debug)]
struct Snapshot {
    vault: Vault,
    holders: Vec<(Pubkey, u64)>,
}

#[derive(FuzzTestMethods)]
struct FuzzTest {
    trident: Trident,
    sim: MockVault,
    holders: Vec<Pubkey>,
    /// Base deposited by successful deposits
    deposited: u64,
    /// Position added by harvests
    harvested: u64,
}

#[flow_executor]
impl FuzzTest {
    fn new() -> Self {
        Self {
            trident: Trident::default(),
            sim: MockVault::new(),
            holders: Vec::new(),
            deposited: 0,
            harvested: 0,
        }
    }

    #[init]
    fn start(&mut self) {
        let mut rng = rand::thread_rng();

        self.sim = MockVault::new();
        self.sim.vault.auto_compound = rng.gen_bool(0.5);
        // lossy pool and swap: never more out than in
        self.sim.ext.pool.mint_rate_bps = rng.gen_range(BPS / 2..=BPS);
        self.sim.ext.pool.redeem_rate_bps = rng.gen_range(BPS / 2..=BPS);
        self.sim.ext.swap.rate_bps = rng.gen_range(0..=BPS);

        self.holders = (0..HOLDERS).map(|_| Pubkey::new_unique()).collect();
        self.deposited = 0;
        self.harvested = 0;
    }

    #[flow]
    fn flow_deposit(&mut self) {
        let mut rng = rand::thread_rng();
        let owner = self.holders[rng.gen_range(0..HOLDERS)];
        let amount = rng.gen_range(0..1_000_000_000_000u64);

        let before = self.snapshot();
        let rate_before = self.exchange_rate();

        match self.sim.deposit(owner, amount) {
            Ok(receipt) => {
                self.deposited += amount;
                if let Some(record) = receipt.harvest {
                    self.harvested += record.position_gained;
                }
                assert!(receipt.shares_minted > 0, "Invariant: a successful deposit mints shares");
                assert!(
                    self.exchange_rate() >= rate_before || before.vault.total_shares == 0,
                    "Invariant: deposits never dilute existing holders"
                );
            }
            Err(_) => {
                assert_eq!(self.snapshot(), before, "Invariant: failed deposit is atomic");
            }
        }
    }

    #[flow]
    fn flow_withdraw(&mut self) {
        let mut rng = rand::thread_rng();
        let owner = self.holders[rng.gen_range(0..HOLDERS)];
        let balance = self.sim.balance_of(&owner);
        if balance == 0 {
            return;
        }
        let shares = rng.gen_range(1..=balance);

        let before = self.snapshot();
        let value_before = self.sim.value_of(&owner).unwrap();

        match self.sim.withdraw(owner, shares) {
            Ok(receipt) => {
                assert_eq!(self.sim.balance_of(&owner), balance - shares);
                if let Some(record) = receipt.harvest {
                    self.harvested += record.position_gained;
                } else {
                    assert!(
                        receipt.position_released <= value_before,
                        "Invariant: cannot release more position than the shares are worth"
                    );
                }
            }
            Err(_) => {
                assert_eq!(self.snapshot(), before, "Invariant: failed withdrawal is atomic");
            }
        }
    }

    #[flow]
    fn flow_harvest(&mut self) {
        let rewards = rand::thread_rng().gen_range(0..1_000_000_000u64);
        self.sim.ext.gauge.accrue(rewards);

        let shares_before = self.sim.vault.total_shares;
        let rate_before = self.exchange_rate();

        let record = self.sim.harvest().unwrap();
        self.harvested += record.position_gained;

        assert_eq!(
            self.sim.vault.total_shares, shares_before,
            "Invariant: harvest mints no shares"
        );
        assert!(
            self.exchange_rate() >= rate_before,
            "Invariant: harvest never lowers the exchange rate"
        );
    }

    /// One collaborator reverts or lies for a single operation
    #[flow]
    fn flow_faulty_collaborator(&mut self) {
        let mut rng = rand::thread_rng();
        let owner = self.holders[rng.gen_range(0..HOLDERS)];

        let ext = &mut self.sim.ext;
        match rng.gen_range(0..7) {
            0 => ext.gauge.fail_stake = true,
            1 => ext.pool.fail_withdraw = true,
            2 => ext.pool.reported_mint = Some(rng.gen_range(1..u64::MAX / 2)),
            3 => ext.pool.fail_deposit = true,
            4 => ext.swap.reported_out = Some(rng.gen_range(1..u64::MAX / 2)),
            5 => {
                // only reached through auto-compound
                ext.gauge.accrue(rng.gen_range(1..1_000_000u64));
                ext.gauge.fail_claim = true;
            }
            _ => ext.gauge.fail_unstake = true,
        }

        let before = self.snapshot();
        let balance = self.sim.balance_of(&owner);
        let result = if balance > 0 && rng.gen_bool(0.5) {
            self.sim.withdraw(owner, balance).map(|receipt| receipt.harvest)
        } else {
            let amount = rng.gen_range(1..1_000_000u64);
            self.sim.deposit(owner, amount).map(|receipt| {
                self.deposited += amount;
                receipt.harvest
            })
        };

        let ext = &mut self.sim.ext;
        ext.gauge.fail_stake = false;
        ext.gauge.fail_unstake = false;
        ext.gauge.fail_claim = false;
        ext.pool.fail_withdraw = false;
        ext.pool.fail_deposit = false;
        ext.pool.reported_mint = None;
        ext.swap.reported_out = None;

        match result {
            Ok(harvest) => self.harvested += harvest.map_or(0, |record| record.position_gained),
            Err(_) => assert_eq!(self.snapshot(), before, "Invariant: failed operation is atomic"),
        }
    }

    #[end]
    fn end(&mut self) {
        self.check_ledger();

        // Account layout stays within the allocated space
        let encoded = borsh::to_vec(&self.sim.vault).unwrap();
        assert_eq!(8 + encoded.len(), Vault::LEN);
        let encoded = borsh::to_vec(&ShareBalance::default()).unwrap();
        assert_eq!(8 + encoded.len(), ShareBalance::LEN);

        // Everyone exits; the vault must be able to pay all of them
        let ext = &mut self.sim.ext;
        ext.pool.redeem_rate_bps = BPS;
        for owner in self.holders.clone() {
            let balance = self.sim.balance_of(&owner);
            if balance > 0 {
                let receipt = self.sim.withdraw(owner, balance).unwrap();
                self.harvested += receipt.harvest.map_or(0, |record| record.position_gained);
            }
        }
        assert_eq!(self.sim.vault.total_shares, 0);
        assert!(self.sim.holders.is_empty());

        // With a lossy pool and no harvested yield, holders as a whole cannot
        // take out more than they put in
        if self.harvested == 0 {
            let paid: u64 = self.sim.paid_out.values().sum();
            assert!(paid <= self.deposited, "Invariant: no profit without harvested yield");
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            vault: self.sim.vault.clone(),
            holders: self
                .holders
                .iter()
                .map(|owner| (*owner, self.sim.balance_of(owner)))
                .collect(),
        }
    }

    fn exchange_rate(&self) -> u64 {
        yield_vault::math::exchange_rate(
            self.sim.vault.total_pool_position,
            self.sim.vault.total_shares,
        )
        .unwrap()
    }

    fn check_ledger(&self) {
        let vault = &self.sim.vault;

        let sum: u64 = self.sim.holders.values().map(|holder| holder.amount).sum();
        assert_eq!(sum, vault.total_shares, "Invariant: balances sum to total shares");

        assert!(
            self.sim.ext.gauge.staked >= vault.total_pool_position,
            "Invariant: gauge holds the position of record"
        );

        let claimed: u64 = self
            .holders
            .iter()
            .map(|owner| self.sim.value_of(owner).unwrap())
            .sum();
        assert!(
            claimed <= vault.total_pool_position,
            "Invariant: holders never claim more than the vault holds"
        );
    }
}

fn main() {
    // Run 1000 iterations with up to 100 flows per iteration
    FuzzTest::fuzz(1000, 100);
}
